use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use worktime_core::DetailedStrategy;

use crate::error::{StoreError, StoreResult};
use crate::write_atomic;

/// Detailed-mode formula (`session_sum` | `subtract_break`).
pub const STRATEGY_KEY: &str = "strategy";
/// Path of a deploy-time cache manifest.
pub const MANIFEST_KEY: &str = "manifest";

/// User settings stored in `config.json`.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Read config from `path`. Returns an empty config if the file doesn't exist.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let values = match serde_json::from_str(&content)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self { values })
    }

    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set `key` from command-line text. Known keys are validated.
    pub fn set(&mut self, key: &str, raw: &str) -> StoreResult<()> {
        if key == STRATEGY_KEY && DetailedStrategy::parse(raw).is_none() {
            return Err(StoreError::InvalidConfig {
                key: key.to_string(),
                value: raw.to_string(),
            });
        }
        self.values.insert(key.to_string(), parse_value(raw));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Configured strategy, or the default when unset or unrecognized.
    pub fn strategy(&self) -> DetailedStrategy {
        match self.get(STRATEGY_KEY).and_then(Value::as_str) {
            Some(raw) => DetailedStrategy::parse(raw).unwrap_or_else(|| {
                tracing::warn!(raw, "unknown strategy in config; using default");
                DetailedStrategy::default()
            }),
            None => DetailedStrategy::default(),
        }
    }

    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.get(MANIFEST_KEY)
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
fn parse_value(s: &str) -> Value {
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::Number(n.into())
            } else {
                Value::String(s.to_string())
            }
        }
    }
}
