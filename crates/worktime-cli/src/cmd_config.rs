use clap::Subcommand;
use worktime_store::{Config, WorktimePaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (strategy, manifest)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, paths: &WorktimePaths) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(paths, &key, &value),
        ConfigCmd::Get { key } => get(paths, &key),
        ConfigCmd::List => list(paths),
    }
}

// ── Command Implementations ──

/// `worktime config set <key> <value>`
pub fn set(paths: &WorktimePaths, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = Config::load(&paths.config_json)?;
    config.set(key, value)?;
    config.save(&paths.config_json)?;
    println!("{key} = {value}");
    Ok(())
}

/// `worktime config get <key>`
pub fn get(paths: &WorktimePaths, key: &str) -> anyhow::Result<()> {
    let config = Config::load(&paths.config_json)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `worktime config list`
pub fn list(paths: &WorktimePaths) -> anyhow::Result<()> {
    let config = Config::load(&paths.config_json)?;
    if config.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in config.iter() {
            println!("{k} = {v}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use worktime_core::DetailedStrategy;

    #[test]
    fn set_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(tmp.path());
        set(&paths, "strategy", "subtract_break").unwrap();
        set(&paths, "manifest", "/srv/worktime/manifest.json").unwrap();

        let config = Config::load(&paths.config_json).unwrap();
        assert_eq!(config.strategy(), DetailedStrategy::SubtractBreak);
        assert_eq!(
            config.manifest_path().as_deref(),
            Some(std::path::Path::new("/srv/worktime/manifest.json"))
        );
    }

    #[test]
    fn invalid_strategy_is_not_written() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(tmp.path());
        assert!(set(&paths, "strategy", "average").is_err());
        assert!(!paths.config_json.exists());
    }

    #[test]
    fn get_and_list_on_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(tmp.path());
        get(&paths, "strategy").unwrap();
        list(&paths).unwrap();
    }
}
