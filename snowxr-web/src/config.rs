use serde::Deserialize;

use crate::controller::Handedness;
use crate::error::ConfigError;

const EMBEDDED: &str = include_str!("../snowxr.toml");

/// Runtime configuration read from `snowxr.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scene: SceneConfig,
    pub assets: AssetConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneConfig {
    pub default: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetConfig {
    pub base_path: String,
    pub models_dir: String,
    pub models: Vec<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionConfig {
    pub pointer_hand: Handedness,
    pub torch_hand: Handedness,
    /// Hand whose thumbstick moves the dolly.
    pub move_hand: Handedness,
    pub thumbstick_dead_zone: f32,
    pub move_speed: f32,
    pub turn_speed: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pointer_hand: Handedness::Right,
            torch_hand: Handedness::Left,
            move_hand: Handedness::Left,
            thumbstick_dead_zone: 0.2,
            move_speed: 2.0,
            turn_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    pub optional_features: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            optional_features: vec![
                "local-floor".into(),
                "bounded-floor".into(),
                "hand-tracking".into(),
                "layers".into(),
            ],
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// The configuration compiled into the bundle.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interaction.thumbstick_dead_zone < 0.0 || self.interaction.thumbstick_dead_zone >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "thumbstick_dead_zone must be in [0, 1), got {}",
                self.interaction.thumbstick_dead_zone
            )));
        }
        if self.interaction.pointer_hand == Handedness::None {
            return Err(ConfigError::Invalid("pointer_hand must be left or right".into()));
        }
        if self.scene.default.is_empty() {
            return Err(ConfigError::Invalid("scene.default must not be empty".into()));
        }
        Ok(())
    }

    /// Path the asset loader is asked for, relative to `base_path`.
    /// Unknown level names fall back to `Info`.
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Scene name from a `location.search` string (`?scene=basic&x=1`),
    /// falling back to the configured default.
    pub fn scene_from_query(&self, query: &str) -> String {
        scene_param(query).unwrap_or_else(|| self.scene.default.clone())
    }
}

fn scene_param(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "scene")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
