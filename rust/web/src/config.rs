use crate::events::DEFAULT_EVENT_BUFFER;
use holdem_engine::config::{FirstToAct, TableConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "HOLDEM_CONFIG";

/// Everything the server needs to start: where to listen and the stakes
/// every new table is dealt with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub event_buffer: usize,
    pub table: TableConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            event_buffer: DEFAULT_EVENT_BUFFER,
            table: TableConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    event_buffer: Option<usize>,
    #[serde(default)]
    small_blind: Option<u32>,
    #[serde(default)]
    big_blind: Option<u32>,
    #[serde(default)]
    starting_stack: Option<u32>,
    #[serde(default)]
    postflop_first_to_act: Option<FirstToAct>,
}

impl ServerSettings {
    /// Resolves settings from defaults, then the TOML file named by
    /// `HOLDEM_CONFIG`, then `HOLDEM_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerSettings::load`] with a caller-supplied variable
    /// lookup.
    pub fn resolve<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(path) = env(CONFIG_PATH_VAR) {
            settings.apply_file(Path::new(&path))?;
        }

        if let Some(host) = env("HOLDEM_HOST") {
            settings.host = host;
        }
        if let Some(port) = env("HOLDEM_PORT") {
            settings.port = parse_var("HOLDEM_PORT", &port)?;
        }
        if let Some(buffer) = env("HOLDEM_EVENT_BUFFER") {
            settings.event_buffer = parse_var("HOLDEM_EVENT_BUFFER", &buffer)?;
        }
        if let Some(sb) = env("HOLDEM_SMALL_BLIND") {
            settings.table.small_blind = parse_var("HOLDEM_SMALL_BLIND", &sb)?;
        }
        if let Some(bb) = env("HOLDEM_BIG_BLIND") {
            settings.table.big_blind = parse_var("HOLDEM_BIG_BLIND", &bb)?;
        }
        if let Some(stack) = env("HOLDEM_STARTING_STACK") {
            settings.table.starting_stack = parse_var("HOLDEM_STARTING_STACK", &stack)?;
        }
        if let Some(order) = env("HOLDEM_POSTFLOP_FIRST_TO_ACT") {
            settings.table.postflop_first_to_act = parse_first_to_act(&order)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Overlays the values present in a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.host {
            self.host = v;
        }
        if let Some(v) = f.port {
            self.port = v;
        }
        if let Some(v) = f.event_buffer {
            self.event_buffer = v;
        }
        if let Some(v) = f.small_blind {
            self.table.small_blind = v;
        }
        if let Some(v) = f.big_blind {
            self.table.big_blind = v;
        }
        if let Some(v) = f.starting_stack {
            self.table.starting_stack = v;
        }
        if let Some(v) = f.postflop_first_to_act {
            self.table.postflop_first_to_act = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid("event_buffer must be >0".into()));
        }
        self.table
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}: cannot parse `{value}`")))
}

fn parse_first_to_act(value: &str) -> Result<FirstToAct, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "dealer" => Ok(FirstToAct::Dealer),
        "non_dealer" | "nondealer" | "big_blind" => Ok(FirstToAct::NonDealer),
        other => Err(ConfigError::Invalid(format!(
            "HOLDEM_POSTFLOP_FIRST_TO_ACT: unknown value `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let settings = ServerSettings::resolve(lookup(&[])).expect("defaults");
        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.table.big_blind, 100);
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "port = 9000\nbig_blind = 200\nsmall_blind = 100\npostflop_first_to_act = \"non_dealer\""
        )
        .expect("write");
        let path = file.path().to_string_lossy().to_string();

        let settings = ServerSettings::resolve(lookup(&[
            (CONFIG_PATH_VAR, path.as_str()),
            ("HOLDEM_PORT", "9100"),
        ]))
        .expect("resolve");
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.table.big_blind, 200);
        assert_eq!(settings.table.small_blind, 100);
        assert_eq!(settings.table.postflop_first_to_act, FirstToAct::NonDealer);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let settings =
            ServerSettings::resolve(lookup(&[("HOLDEM_HOST", "")])).expect("resolve");
        assert_eq!(settings.host, "127.0.0.1");
    }

    #[test]
    fn rejects_unparsable_numbers() {
        let err = ServerSettings::resolve(lookup(&[("HOLDEM_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("HOLDEM_PORT")));
    }

    #[test]
    fn rejects_inconsistent_blinds() {
        let err = ServerSettings::resolve(lookup(&[("HOLDEM_SMALL_BLIND", "500")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_stack_that_overflows_a_pot() {
        let err = ServerSettings::resolve(lookup(&[("HOLDEM_STARTING_STACK", "3000000000")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("starting_stack")));
    }

    #[test]
    fn unknown_file_keys_are_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "colour = \"green\"").expect("write");
        let mut settings = ServerSettings::default();
        assert!(matches!(
            settings.apply_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
