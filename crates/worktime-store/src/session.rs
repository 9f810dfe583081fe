use worktime_core::{
    compute_with, DetailedStrategy, Field, Mode, QuickPick, Readout, ShiftInput, WorkedResult,
};

use crate::kv::KeyValueStore;
use crate::persist::StatePersistence;

/// Owns the one live [`ShiftInput`].
///
/// Every mutation saves first and then recomputes, so what is stored is never
/// behind what is displayed. Storage failures are logged and swallowed: data
/// entry is never blocked by the disk.
pub struct Session<S> {
    persistence: StatePersistence<S>,
    strategy: DetailedStrategy,
    input: ShiftInput,
    result: WorkedResult,
}

impl<S: KeyValueStore> Session<S> {
    /// Load the last state and compute once.
    pub fn open(persistence: StatePersistence<S>, strategy: DetailedStrategy) -> Self {
        let input = persistence.load();
        let result = compute_with(&input, strategy);
        Self {
            persistence,
            strategy,
            input,
            result,
        }
    }

    pub fn input(&self) -> &ShiftInput {
        &self.input
    }

    pub fn result(&self) -> WorkedResult {
        self.result
    }

    pub fn readout(&self) -> Readout {
        self.result.readout()
    }

    pub fn strategy(&self) -> DetailedStrategy {
        self.strategy
    }

    pub fn persistence(&self) -> &StatePersistence<S> {
        &self.persistence
    }

    /// Switch formula. Nothing is persisted: the strategy is configuration.
    pub fn set_strategy(&mut self, strategy: DetailedStrategy) -> Readout {
        self.strategy = strategy;
        self.recompute()
    }

    /// Direct text edit of one field.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) -> Readout {
        self.input.set_field(field, value);
        self.commit()
    }

    /// Quick-pick button press.
    pub fn pick(&mut self, pick: &QuickPick) -> Readout {
        pick.apply(&mut self.input);
        self.commit()
    }

    /// Switch break-input style. The other style's values are kept.
    pub fn set_mode(&mut self, mode: Mode) -> Readout {
        self.input.mode = mode;
        self.commit()
    }

    pub fn adjust_break(&mut self, delta: i64) -> Readout {
        self.input.adjust_break_minutes(delta);
        self.commit()
    }

    pub fn reset_break(&mut self) -> Readout {
        self.input.reset_break_minutes();
        self.commit()
    }

    /// Drop everything persisted and start over from an empty load.
    pub fn reset(&mut self) -> Readout {
        self.input = match self.persistence.clear() {
            Ok(()) => self.persistence.load(),
            Err(err) => {
                // whatever survived the failed clear must not come back
                tracing::warn!(%err, "failed to clear stored state");
                ShiftInput::default()
            }
        };
        tracing::debug!("session reset");
        self.recompute()
    }

    fn commit(&mut self) -> Readout {
        if let Err(err) = self.persistence.save(&self.input) {
            tracing::warn!(%err, "failed to save state; continuing with in-memory values");
        }
        self.recompute()
    }

    fn recompute(&mut self) -> Readout {
        self.result = compute_with(&self.input, self.strategy);
        self.result.readout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::kv::MemoryStore;
    use crate::persist::STATE_KEY;
    use worktime_core::{PickGroup, QuickPickTable};

    fn fresh() -> Session<MemoryStore> {
        Session::open(
            StatePersistence::new(MemoryStore::new()),
            DetailedStrategy::default(),
        )
    }

    /// Rejects every write; reads see nothing.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
        fn remove(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[test]
    fn open_on_empty_store_shows_sentinel() {
        let session = fresh();
        assert_eq!(session.result(), WorkedResult::Empty);
        assert!(session.readout().is_empty);
    }

    #[test]
    fn edits_are_saved_before_display() {
        let mut session = fresh();
        session.edit(Field::Start, "08:00");
        session.edit(Field::BreakStart, "12:00");
        session.edit(Field::BreakEnd, "12:30");
        let readout = session.edit(Field::End, "16:00");
        assert_eq!(readout.hours_minutes, "7h 30m");
        assert_eq!(session.persistence().load(), *session.input());
    }

    #[test]
    fn reopen_restores_fields_and_result() {
        let store = MemoryStore::new();
        {
            let mut session =
                Session::open(StatePersistence::new(&store), DetailedStrategy::default());
            session.edit(Field::Start, "08:00");
            session.edit(Field::End, "17:00");
            session.set_mode(Mode::Simple);
            session.edit(Field::BreakMinutes, "60");
        }
        let session =
            Session::open(StatePersistence::new(&store), DetailedStrategy::default());
        assert_eq!(session.input().mode, Mode::Simple);
        assert_eq!(session.readout().hours_minutes, "8h 00m");
        assert_eq!(session.readout().decimal, "8.00");
    }

    #[test]
    fn quick_picks_and_adjustments() {
        let table = QuickPickTable::default();
        let mut session = fresh();
        session.set_mode(Mode::Simple);
        session.pick(table.find(PickGroup::Start, "08:00").unwrap());
        session.pick(table.find(PickGroup::End, "17:00").unwrap());
        let readout = session.pick(table.find(PickGroup::SimpleBreak, "-1h").unwrap());
        assert_eq!(readout.hours_minutes, "8h 00m");

        let readout = session.adjust_break(30);
        assert_eq!(readout.hours_minutes, "7h 30m");
        assert_eq!(session.input().break_minutes, "90");

        let readout = session.reset_break();
        assert_eq!(readout.hours_minutes, "9h 00m");
    }

    #[test]
    fn mode_switch_keeps_both_breaks() {
        let mut session = fresh();
        session.edit(Field::Start, "08:00");
        session.edit(Field::End, "16:00");
        session.edit(Field::BreakStart, "12:00");
        session.edit(Field::BreakEnd, "13:00");
        session.set_mode(Mode::Simple);
        session.edit(Field::BreakMinutes, "30");
        assert_eq!(session.readout().hours_minutes, "7h 30m");
        let readout = session.set_mode(Mode::Detailed);
        assert_eq!(readout.hours_minutes, "7h 00m");
        assert_eq!(session.input().break_minutes, "30");
    }

    #[test]
    fn reset_clears_storage_and_memory() {
        let mut session = fresh();
        session.edit(Field::Start, "08:00");
        session.edit(Field::End, "16:00");
        session.set_mode(Mode::Simple);
        let readout = session.reset();
        assert!(readout.is_empty);
        assert_eq!(*session.input(), ShiftInput::default());
        assert_eq!(session.persistence().store().get(STATE_KEY).unwrap(), None);
    }

    /// Reads and writes work; removals fail.
    struct UndeletableStore(MemoryStore);

    impl KeyValueStore for UndeletableStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.0.set(key, value)
        }
        fn remove(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn failed_clear_still_resets_memory() {
        let mut session = Session::open(
            StatePersistence::new(UndeletableStore(MemoryStore::new())),
            DetailedStrategy::default(),
        );
        session.edit(Field::Start, "08:00");
        session.edit(Field::End, "16:00");
        session.set_mode(Mode::Simple);

        let readout = session.reset();
        assert!(readout.is_empty);
        assert_eq!(*session.input(), ShiftInput::default());
        assert_eq!(session.input().mode, Mode::Detailed);
    }

    #[test]
    fn broken_storage_never_blocks_entry() {
        let mut session = Session::open(
            StatePersistence::new(BrokenStore),
            DetailedStrategy::default(),
        );
        session.edit(Field::Start, "09:00");
        let readout = session.edit(Field::End, "17:15");
        assert_eq!(readout.hours_minutes, "8h 15m");
        let readout = session.reset();
        assert!(readout.is_empty);
    }

    #[test]
    fn strategy_switch_recomputes_without_saving() {
        let mut session = fresh();
        session.edit(Field::Start, "08:00");
        session.edit(Field::BreakStart, "12:00");
        session.edit(Field::BreakEnd, "12:45");
        session.edit(Field::End, "16:00");
        let readout = session.set_strategy(DetailedStrategy::SubtractBreak);
        assert_eq!(session.strategy(), DetailedStrategy::SubtractBreak);
        assert_eq!(readout.total_minutes, Some(435));
    }
}
