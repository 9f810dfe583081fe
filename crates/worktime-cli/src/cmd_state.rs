use anyhow::Context;
use std::io::BufRead;
use worktime_core::{Field, Mode, PickGroup, QuickPickTable, Readout, ShiftInput};
use worktime_store::{Config, FileStore, Session, StatePersistence, WorktimePaths};

// ── Shared helpers ──

/// Load config and saved state, creating the store layout on first use.
pub(crate) fn open_session(paths: &WorktimePaths) -> anyhow::Result<Session<FileStore>> {
    paths
        .ensure_layout()
        .with_context(|| format!("creating store at {}", paths.root.display()))?;
    let config = Config::load(&paths.config_json)?;
    let persistence = StatePersistence::new(FileStore::new(&paths.state_dir));
    Ok(Session::open(persistence, config.strategy()))
}

pub(crate) fn print_readout(readout: &Readout) {
    println!("Worked: {} ({} h)", readout.hours_minutes, readout.decimal);
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn print_shift(input: &ShiftInput) {
    println!("Start:        {}", or_dash(&input.start));
    println!("End:          {}", or_dash(&input.end));
    println!("Mode:         {}", input.mode.as_str());
    match input.mode {
        Mode::Detailed => {
            println!("Break start:  {}", or_dash(&input.break_start));
            println!("Break end:    {}", or_dash(&input.break_end));
        }
        Mode::Simple => {
            println!("Break:        {} min", input.simple_break_minutes());
        }
    }
}

fn parse_field(raw: &str) -> anyhow::Result<Field> {
    Field::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
        anyhow::anyhow!("unknown field '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn parse_mode(raw: &str) -> anyhow::Result<Mode> {
    Mode::parse(raw)
        .ok_or_else(|| anyhow::anyhow!("unknown mode '{raw}' (expected detailed or simple)"))
}

/// Read one answer line; only `y`/`yes` confirms.
fn confirm(reader: &mut impl BufRead) -> std::io::Result<bool> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

// ── Command Implementations ──

/// `worktime show`
pub fn show(paths: &WorktimePaths, json: bool) -> anyhow::Result<()> {
    let session = open_session(paths)?;
    if json {
        let out = serde_json::json!({
            "input": session.input(),
            "strategy": session.strategy(),
            "readout": session.readout(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print_shift(session.input());
    print_readout(&session.readout());
    Ok(())
}

/// `worktime set <field> <value>`
pub fn set(paths: &WorktimePaths, field: &str, value: &str) -> anyhow::Result<()> {
    let field = parse_field(field)?;
    let mut session = open_session(paths)?;
    let readout = session.edit(field, value);
    print_readout(&readout);
    Ok(())
}

/// `worktime pick <group> <label>`
pub fn pick(paths: &WorktimePaths, group: &str, label: &str) -> anyhow::Result<()> {
    let table = QuickPickTable::default();
    let group = PickGroup::parse(group).ok_or_else(|| {
        let known: Vec<&str> = PickGroup::ALL.iter().map(|g| g.as_str()).collect();
        anyhow::anyhow!("unknown group '{group}' (expected one of: {})", known.join(", "))
    })?;
    let Some(quick) = table.find(group, label) else {
        let labels: Vec<&str> = table.group(group).map(|p| p.label.as_str()).collect();
        anyhow::bail!(
            "no quick pick '{label}' in {} (available: {})",
            group.as_str(),
            labels.join(", ")
        );
    };
    let mut session = open_session(paths)?;
    let readout = session.pick(quick);
    println!("{} = {}", quick.field().as_str(), quick.value);
    print_readout(&readout);
    Ok(())
}

/// `worktime picks`
pub fn picks() -> anyhow::Result<()> {
    let table = QuickPickTable::default();
    for group in PickGroup::ALL {
        let labels: Vec<&str> = table.group(group).map(|p| p.label.as_str()).collect();
        println!("{:<14}{}", group.as_str(), labels.join("  "));
    }
    Ok(())
}

/// `worktime adjust <delta>`
pub fn adjust(paths: &WorktimePaths, delta: i64) -> anyhow::Result<()> {
    let mut session = open_session(paths)?;
    let readout = session.adjust_break(delta);
    println!("Break: {} min", session.input().simple_break_minutes());
    print_readout(&readout);
    Ok(())
}

/// `worktime mode <detailed|simple>`
pub fn mode(paths: &WorktimePaths, raw: &str) -> anyhow::Result<()> {
    let mode = parse_mode(raw)?;
    let mut session = open_session(paths)?;
    let readout = session.set_mode(mode);
    println!("Mode: {}", mode.as_str());
    print_readout(&readout);
    Ok(())
}

/// `worktime reset [--yes]`
pub fn reset(paths: &WorktimePaths, yes: bool) -> anyhow::Result<()> {
    if !yes {
        eprint!("Clear the saved shift? [y/N] ");
        if !confirm(&mut std::io::stdin().lock())? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let mut session = open_session(paths)?;
    let readout = session.reset();
    println!("Cleared.");
    print_readout(&readout);
    Ok(())
}
