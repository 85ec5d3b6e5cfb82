use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub run: RunConfig,
    pub instrument: InstrumentConfig,
    /// Trigger name to shell command printing a number
    pub triggers: HashMap<String, String>,
}

/// Defaults for the top-level repeat wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub repeats: u32,
    pub interval_secs: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repeats: 1,
            interval_secs: 0.0,
        }
    }
}

impl RunConfig {
    pub fn interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.interval_secs)
            .context(format!("Invalid run.interval_secs: {}", self.interval_secs))
    }
}

/// Shell command templates for the instrument; `{protocol}` is replaced
/// with the protocol name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub protocol_command: Option<String>,
    pub progress_command: Option<String>,
    pub stop_command: Option<String>,
}

impl InstrumentConfig {
    pub fn is_configured(&self) -> bool {
        self.protocol_command.is_some() || self.progress_command.is_some() || self.stop_command.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            run: RunConfig::default(),
            instrument: InstrumentConfig::default(),
            triggers: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
