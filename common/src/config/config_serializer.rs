use serde::{Deserialize, Serialize};

/// Text encoding shared by the game config, the server config and the score file.
pub trait ConfigSerializer<TConfig> {
    fn serialize(&self, config: &TConfig) -> Result<String, String>;
    fn deserialize(&self, content: &str) -> Result<TConfig, String>;
}

#[derive(Default)]
pub struct YamlConfigSerializer;

impl YamlConfigSerializer {
    pub fn new() -> Self {
        Self
    }
}

fn describe_yaml_error(error: &serde_yaml_ng::Error) -> String {
    match error.location() {
        Some(location) => format!(
            "line {}, column {}: {}",
            location.line(),
            location.column(),
            error
        ),
        None => error.to_string(),
    }
}

impl<TConfig> ConfigSerializer<TConfig> for YamlConfigSerializer
where
    TConfig: for<'de> Deserialize<'de> + Serialize,
{
    fn serialize(&self, config: &TConfig) -> Result<String, String> {
        serde_yaml_ng::to_string(config).map_err(|e| format!("Failed to write YAML: {}", e))
    }

    fn deserialize(&self, content: &str) -> Result<TConfig, String> {
        serde_yaml_ng::from_str(content)
            .map_err(|e| format!("Failed to read YAML at {}", describe_yaml_error(&e)))
    }
}
