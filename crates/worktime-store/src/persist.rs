use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use worktime_core::{Field, Mode, ShiftInput, DEFAULT_BREAK_MINUTES};

use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Key of the full field record.
pub const STATE_KEY: &str = "wt_state";
/// Key holding only the mode, readable even when the record is damaged.
pub const MODE_KEY: &str = "wt_pause_mode";
/// Current shape of [`PersistedRecord`].
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_FIELD: &str = "schema";
const MODE_FIELD: &str = "mode";

/// The stored projection of a [`ShiftInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub schema: u32,
    pub start: String,
    pub end: String,
    pub break_start: String,
    pub break_end: String,
    pub break_minutes: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl PersistedRecord {
    pub fn from_input(input: &ShiftInput) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            start: input.start.clone(),
            end: input.end.clone(),
            break_start: input.break_start.clone(),
            break_end: input.break_end.clone(),
            break_minutes: input.break_minutes.clone(),
            mode: input.mode,
            saved_at: None,
        }
    }
}

/// Saves and restores the last-entered [`ShiftInput`].
pub struct StatePersistence<S> {
    store: S,
}

impl<S: KeyValueStore> StatePersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the mode key, then the record. The mode key wins on load, so it
    /// goes first: a failed second write cannot leave it stale.
    pub fn save(&self, input: &ShiftInput) -> StoreResult<()> {
        let mut record = PersistedRecord::from_input(input);
        record.saved_at = Some(now_rfc3339());
        let json = serde_json::to_string(&record)?;
        self.save_mode(input.mode)?;
        self.store.set(STATE_KEY, &json)
    }

    pub fn save_mode(&self, mode: Mode) -> StoreResult<()> {
        self.store.set(MODE_KEY, mode.as_str())
    }

    /// Restore the last input. Never fails: every field falls back to its
    /// default on its own, so one bad value does not lose the others.
    pub fn load(&self) -> ShiftInput {
        let mut input = ShiftInput::default();
        let record = self.read_key(STATE_KEY).and_then(|raw| parse_record(&raw));

        if let Some(record) = &record {
            if let Some(schema) = record.get(SCHEMA_FIELD).and_then(Value::as_u64) {
                if schema > u64::from(SCHEMA_VERSION) {
                    tracing::warn!(
                        schema,
                        supported = SCHEMA_VERSION,
                        "stored state is newer than supported; reading known fields only"
                    );
                }
            }
            for field in Field::ALL {
                if let Some(value) = field_value(record, field) {
                    input.set_field(field, value);
                }
            }
        }

        let stored_mode = self
            .read_key(MODE_KEY)
            .and_then(|raw| parse_mode(&raw, MODE_KEY));
        let record_mode = record
            .as_ref()
            .and_then(|r| r.get(MODE_FIELD))
            .and_then(Value::as_str)
            .and_then(|raw| parse_mode(raw, MODE_FIELD));
        input.mode = stored_mode.or(record_mode).unwrap_or_default();
        input
    }

    /// Remove every persisted key.
    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(STATE_KEY)?;
        self.store.remove(MODE_KEY)
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "storage read failed; using defaults");
                None
            }
        }
    }
}

fn parse_record(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::warn!("stored state is not an object; ignoring it");
            None
        }
        Err(err) => {
            tracing::warn!(%err, "stored state is not valid JSON; ignoring it");
            None
        }
    }
}

/// One field from a raw record. Numbers are accepted for the minute field.
fn field_value(record: &Map<String, Value>, field: Field) -> Option<String> {
    match (record.get(field.as_str())?, field) {
        (Value::String(s), _) => Some(s.clone()),
        (Value::Number(n), Field::BreakMinutes) => Some(n.to_string()),
        (Value::Null, Field::BreakMinutes) => Some(DEFAULT_BREAK_MINUTES.to_string()),
        (other, _) => {
            tracing::warn!(field = field.as_str(), value = %other, "unexpected stored value; using default");
            None
        }
    }
}

fn parse_mode(raw: &str, source: &str) -> Option<Mode> {
    let mode = Mode::parse(raw);
    if mode.is_none() {
        tracing::warn!(source, raw, "unknown stored mode");
    }
    mode
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
