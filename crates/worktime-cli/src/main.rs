mod cmd_calc;
mod cmd_config;
mod cmd_offline;
mod cmd_state;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use worktime_store::WorktimePaths;

#[derive(Parser)]
#[command(name = "worktime", version, about = "Work-hours calculator")]
struct Cli {
    /// Store root (defaults to $WORKTIME_HOME, then the platform data dir)
    #[arg(long, global = true)]
    home: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the saved shift and the worked time
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set one field (start, end, break_start, break_end, break_minutes)
    Set {
        field: String,
        /// New text; empty clears the field
        #[arg(default_value = "")]
        value: String,
    },
    /// Apply a quick pick (see `worktime picks`)
    Pick {
        /// Group: start, break_start, break_end, simple_break, end
        group: String,
        /// Button label, e.g. 08:00 or -1h
        label: String,
    },
    /// List the quick picks
    Picks,
    /// Move the simple break by a number of minutes (e.g. 15, -15)
    Adjust {
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Switch break input: detailed or simple
    Mode { mode: String },
    /// Forget the saved shift
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Compute worked time without touching saved state
    Calc {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, conflicts_with = "break_minutes")]
        break_start: Option<String>,
        #[arg(long, conflicts_with = "break_minutes")]
        break_end: Option<String>,
        /// Simple break in minutes (selects simple mode)
        #[arg(long)]
        break_minutes: Option<String>,
        /// session_sum or subtract_break (default: configured)
        #[arg(long)]
        strategy: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage settings in config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Drive the offline asset cache
    Offline {
        #[command(subcommand)]
        cmd: cmd_offline::OfflineCmd,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let paths = match cli.home {
        Some(root) => WorktimePaths::discover(root),
        None => WorktimePaths::from_env(),
    };

    match cli.cmd {
        Command::Show { json } => cmd_state::show(&paths, json),
        Command::Set { field, value } => cmd_state::set(&paths, &field, &value),
        Command::Pick { group, label } => cmd_state::pick(&paths, &group, &label),
        Command::Picks => cmd_state::picks(),
        Command::Adjust { delta } => cmd_state::adjust(&paths, delta),
        Command::Mode { mode } => cmd_state::mode(&paths, &mode),
        Command::Reset { yes } => cmd_state::reset(&paths, yes),
        Command::Calc {
            start,
            end,
            break_start,
            break_end,
            break_minutes,
            strategy,
            json,
        } => cmd_calc::execute(
            &paths,
            cmd_calc::CalcParams {
                start,
                end,
                break_start,
                break_end,
                break_minutes,
                strategy: strategy.as_deref(),
                json,
            },
        ),
        Command::Config { cmd } => cmd_config::run(cmd, &paths),
        Command::Offline { cmd } => cmd_offline::run(cmd, &paths),
    }
}
