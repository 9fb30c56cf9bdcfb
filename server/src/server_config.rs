use std::path::PathBuf;

use common::config::{ConfigManager, FileContentConfigProvider, Validate, YamlConfigSerializer};
use common::games::snake::EngineSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "token_snake_server.yaml";

/// Fetches token transfers and turns new ones into moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub explorer_url: String,
    /// Token whose transfers are polled. The poller is disabled when unset.
    pub token_address: Option<String>,
    /// Name of the environment variable holding the explorer API key.
    pub api_key_env: String,
    pub poll_interval_ms: u64,
    pub page_size: u32,
    pub known_signature_capacity: usize,
    pub timer_interval_ms: Option<u64>,
    pub timer_moves_per_interval: Option<u64>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            explorer_url: "https://pro-api.solscan.io/v2.0/token/transfer".to_string(),
            token_address: None,
            api_key_env: "SOLSCAN_API_KEY".to_string(),
            poll_interval_ms: 1_000,
            page_size: 10,
            known_signature_capacity: 1_000,
            timer_interval_ms: None,
            timer_moves_per_interval: None,
        }
    }
}

impl TriggerConfig {
    /// Interval and move count, when the timer trigger is enabled.
    pub fn timer(&self) -> Option<(u64, u64)> {
        match (self.timer_interval_ms, self.timer_moves_per_interval) {
            (Some(interval_ms), Some(moves)) => Some((interval_ms, moves)),
            _ => None,
        }
    }
}

impl Validate for TriggerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.explorer_url.trim().is_empty() {
            return Err("Explorer URL must not be empty".to_string());
        }
        if self.token_address.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err("Token address must not be blank".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("Trigger poll interval must be positive".to_string());
        }
        if self.page_size == 0 {
            return Err("Page size must be positive".to_string());
        }
        if self.known_signature_capacity < self.page_size as usize {
            return Err("Known signature capacity must hold at least one page".to_string());
        }
        match (self.timer_interval_ms, self.timer_moves_per_interval) {
            (None, None) => Ok(()),
            (Some(interval_ms), Some(moves)) if interval_ms > 0 && moves > 0 => Ok(()),
            _ => Err("Timer trigger needs both a positive interval and move count".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// JSON state file. Persistence is off when unset.
    pub state_file: Option<PathBuf>,
    pub save_interval_ms: u64,
    pub restore_on_start: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            save_interval_ms: 10_000,
            restore_on_start: true,
        }
    }
}

impl Validate for PersistenceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.save_interval_ms == 0 {
            return Err("Save interval must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    /// Directory served under `/` for the browser view.
    pub static_dir: Option<PathBuf>,
    pub engine: EngineSettings,
    pub trigger: TriggerConfig,
    pub persistence: PersistenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:3000".to_string(),
            static_dir: None,
            engine: EngineSettings::default(),
            trigger: TriggerConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.listen_address.trim().is_empty() {
            return Err("Listen address must not be empty".to_string());
        }
        self.engine.validate()?;
        self.trigger.validate()?;
        self.persistence.validate()
    }
}

pub fn get_config_manager(
    path: impl Into<PathBuf>,
) -> ConfigManager<FileContentConfigProvider, ServerConfig, YamlConfigSerializer> {
    ConfigManager::from_yaml_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::{ConfigContentProvider, ConfigSerializer};

    fn get_temp_file_path() -> String {
        use std::env;
        let mut path = env::temp_dir();
        let random_number: u32 = rand::random();
        let file_name = format!("temp_token_snake_server_config_{}.yaml", random_number);
        path.push(file_name);
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_config_can_be_serialized_and_deserialized_string() {
        let default_config = ServerConfig::default();
        let serializer = YamlConfigSerializer::new();
        let serialized_string = serializer.serialize(&default_config).unwrap();
        let deserialized_config: ServerConfig = serializer.deserialize(&serialized_string).unwrap();
        assert_eq!(default_config, deserialized_config);
    }

    #[test]
    fn test_default_config_can_be_serialized_and_deserialized_file() {
        let default_config = ServerConfig::default();
        let serializer = YamlConfigSerializer::new();
        let file_path = get_temp_file_path();
        let content_provider = FileContentConfigProvider::new(&file_path);

        let serialized_string = serializer.serialize(&default_config).unwrap();
        assert!(content_provider.set_config_content(&serialized_string).is_ok());

        let read_string = content_provider.get_config_content().unwrap().unwrap();
        let deserialized_config: ServerConfig = serializer.deserialize(&read_string).unwrap();
        assert_eq!(default_config, deserialized_config);

        let _ = std::fs::remove_file(file_path);
    }

    #[test]
    fn test_manager_round_trip() {
        let config = ServerConfig {
            listen_address: "127.0.0.1:3100".to_string(),
            trigger: TriggerConfig {
                token_address: Some("TokenMint111".to_string()),
                ..TriggerConfig::default()
            },
            ..ServerConfig::default()
        };
        let file_path = get_temp_file_path();
        let manager = get_config_manager(&file_path);

        assert!(manager.set_config(&config).is_ok());
        assert_eq!(manager.get_config().unwrap(), config);

        let fresh_manager = get_config_manager(&file_path);
        assert_eq!(fresh_manager.get_config().unwrap(), config);

        let _ = std::fs::remove_file(file_path);
    }

    #[test]
    fn test_missing_file_yields_default() {
        let manager = get_config_manager(get_temp_file_path());
        assert_eq!(manager.get_config().unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_invalid_engine_section_rejected() {
        let file_path = get_temp_file_path();
        std::fs::write(&file_path, "engine:\n  max_moves_per_second: 0\n").unwrap();

        let manager = get_config_manager(&file_path);
        assert!(manager.get_config().is_err());

        let _ = std::fs::remove_file(file_path);
    }

    #[test]
    fn test_timer_requires_both_fields() {
        let trigger = TriggerConfig {
            timer_interval_ms: Some(5_000),
            ..TriggerConfig::default()
        };
        assert!(trigger.validate().is_err());
        assert_eq!(trigger.timer(), None);

        let trigger = TriggerConfig {
            timer_interval_ms: Some(5_000),
            timer_moves_per_interval: Some(2),
            ..TriggerConfig::default()
        };
        assert!(trigger.validate().is_ok());
        assert_eq!(trigger.timer(), Some((5_000, 2)));
    }
}
