use serde::{Deserialize, Serialize};

use crate::games::snake::Settings;
use super::{ConfigManager, FileContentConfigProvider, Validate, YamlConfigSerializer};

const CONFIG_FILE: &str = "snake_game_config.yaml";

pub fn get_config_manager() -> ConfigManager<FileContentConfigProvider, GameConfig, YamlConfigSerializer> {
    ConfigManager::from_yaml_file(CONFIG_FILE)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct GameConfig {
    pub settings: Settings,
    pub multiplayer: MultiplayerConfig,
    pub scores_file: String,
}

impl Validate for GameConfig {
    fn validate(&self) -> Result<(), String> {
        self.multiplayer.validate()?;
        if self.scores_file.trim().is_empty() {
            return Err("scores_file must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            multiplayer: MultiplayerConfig::default(),
            scores_file: "snake_scores.yaml".to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct MultiplayerConfig {
    pub server_address: String,
}

impl Validate for MultiplayerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.server_address.trim().is_empty() {
            return Err("multiplayer.server_address must not be empty".to_string());
        }
        if !self.server_address.starts_with("http://") && !self.server_address.starts_with("https://") {
            return Err("multiplayer.server_address must start with http:// or https://".to_string());
        }
        Ok(())
    }
}

impl Default for MultiplayerConfig {
    fn default() -> Self {
        Self {
            server_address: "http://127.0.0.1:5101".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigContentProvider, ConfigSerializer};
    use crate::games::snake::{Difficulty, Mode};

    fn get_temp_file_path() -> String {
        let mut path = std::env::temp_dir();
        let random_number: u32 = rand::random();
        path.push(format!("temp_snake_game_config_{}.yaml", random_number));
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let default_config = GameConfig::default();
        let serializer = YamlConfigSerializer::new();
        let serialized = serializer.serialize(&default_config).unwrap();
        let deserialized: GameConfig = serializer.deserialize(&serialized).unwrap();
        assert_eq!(default_config, deserialized);
    }

    #[test]
    fn test_manager_persists_and_caches_settings() {
        let manager: ConfigManager<_, GameConfig, _> = ConfigManager::from_yaml_file(get_temp_file_path());

        let updated = manager
            .update_config(|config| {
                config.settings.mode = Mode::Campaign;
                config.settings.difficulty = Difficulty::Hard;
            })
            .unwrap();
        assert_eq!(updated.settings.mode, Mode::Campaign);

        let loaded = manager.get_config().unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn test_config_file_does_not_exist_returns_default_config() {
        let manager: ConfigManager<_, GameConfig, _> =
            ConfigManager::from_yaml_file("this_snake_config_does_not_exist.yaml");
        assert_eq!(manager.get_config().unwrap(), GameConfig::default());
    }

    #[test]
    fn test_invalid_config_cant_be_read() {
        let invalid_config_content = r#"
            settings:
              theme: Neon
              mode: Classic
              map: Box
              difficulty: Medium
              time_limit: Unbounded
              grid_size: Size25
            multiplayer:
              server_address: ""
            scores_file: scores.yaml
        "#;

        let file_path = get_temp_file_path();
        let content_provider = FileContentConfigProvider::new(file_path);
        content_provider.set_config_content(invalid_config_content).unwrap();

        let manager: ConfigManager<_, GameConfig, _> =
            ConfigManager::new(content_provider, YamlConfigSerializer::new());
        assert!(manager.get_config().is_err());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let serializer = YamlConfigSerializer::new();
        let content = serializer
            .serialize(&GameConfig::default())
            .unwrap()
            .replace("Classic", "Zen");
        let result: Result<GameConfig, String> = serializer.deserialize(&content);
        assert!(result.is_err());
    }
}
