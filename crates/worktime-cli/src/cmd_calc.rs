use worktime_core::{compute_with, DetailedStrategy, Mode, Readout, ShiftInput};
use worktime_store::{Config, WorktimePaths};

use crate::cmd_state::print_readout;

pub struct CalcParams<'a> {
    pub start: String,
    pub end: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub break_minutes: Option<String>,
    pub strategy: Option<&'a str>,
    pub json: bool,
}

/// Build the input a one-off calculation runs on. A simple break wins over a range.
fn shift_input(params: &CalcParams<'_>) -> ShiftInput {
    let mut input = ShiftInput {
        start: params.start.clone(),
        end: params.end.clone(),
        break_start: params.break_start.clone().unwrap_or_default(),
        break_end: params.break_end.clone().unwrap_or_default(),
        ..ShiftInput::default()
    };
    if let Some(minutes) = &params.break_minutes {
        input.mode = Mode::Simple;
        input.break_minutes = minutes.clone();
    }
    input
}

fn resolve_strategy(paths: &WorktimePaths, raw: Option<&str>) -> anyhow::Result<DetailedStrategy> {
    match raw {
        Some(raw) => DetailedStrategy::parse(raw).ok_or_else(|| {
            anyhow::anyhow!("unknown strategy '{raw}' (expected session_sum or subtract_break)")
        }),
        None => Ok(Config::load(&paths.config_json)?.strategy()),
    }
}

fn calculate(paths: &WorktimePaths, params: &CalcParams<'_>) -> anyhow::Result<(ShiftInput, Readout)> {
    let strategy = resolve_strategy(paths, params.strategy)?;
    let input = shift_input(params);
    let readout = compute_with(&input, strategy).readout();
    Ok((input, readout))
}

/// `worktime calc --start <t> --end <t> [...]`
pub fn execute(paths: &WorktimePaths, params: CalcParams<'_>) -> anyhow::Result<()> {
    let (input, readout) = calculate(paths, &params)?;
    if params.json {
        let out = serde_json::json!({ "input": input, "readout": readout });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_readout(&readout);
    }
    Ok(())
}
