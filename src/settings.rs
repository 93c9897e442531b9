use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde_derive::Deserialize;

use crate::trust::AllowedImages;

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "SQHEAVEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Readiness {
    pub interval_ms: u64,
    pub max_attempts: u32,
    /// Database role passed to `pg_isready`.
    pub user: String,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 20,
            user: "postgres".to_owned(),
        }
    }
}

impl Readiness {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Container engine CLI.
    pub engine: String,
    /// Compose CLI: the program followed by any fixed leading arguments,
    /// e.g. `["docker", "compose"]`.
    pub compose: Vec<String>,
    /// Directory holding the compose file.
    pub compose_dir: PathBuf,
    pub container_name: String,
    pub image: String,
    pub service: String,
    pub allowed_images: Vec<String>,
    pub readiness: Readiness,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: "docker".to_owned(),
            compose: vec!["docker-compose".to_owned()],
            compose_dir: PathBuf::from("."),
            container_name: "sqheaven-postgres".to_owned(),
            image: "sqheaven-pg:latest".to_owned(),
            service: "db".to_owned(),
            allowed_images: AllowedImages::default().into_vec(),
            readiness: Readiness::default(),
        }
    }
}

impl Settings {
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Start off with either the explicitly requested file or the optional
        // "default" configuration file.
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // Add in settings from the environment (with a prefix of SQHEAVEN).
        // Eg.. `SQHEAVEN_READINESS__MAX_ATTEMPTS=40` sets `readiness.max_attempts`.
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("allowed_images")
                .with_list_parse_key("compose")
                .try_parsing(true),
        );

        // Deserialize (and thus freeze) the entire configuration.
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn allow_list(&self) -> AllowedImages {
        self.allowed_images.iter().cloned().collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.trim().is_empty() {
            return Err(ConfigError::Message("engine must not be empty".into()));
        }
        if self.compose.is_empty() {
            return Err(ConfigError::Message("compose must name a program".into()));
        }
        if self.readiness.max_attempts == 0 {
            return Err(ConfigError::Message(
                "readiness.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
