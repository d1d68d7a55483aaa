use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        *self = Self::new(value, source);
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Table holding event rows
    pub table_name: ConfigValue<String>,
    /// Directory of per-event documents
    pub events_dir: ConfigValue<PathBuf>,
    /// Root of the YYYY/YYYY-MM journal tree
    pub journals_dir: ConfigValue<PathBuf>,
    /// Event document template (built-in when unset)
    pub event_template: ConfigValue<Option<PathBuf>>,
    /// Activities template (built-in when unset)
    pub activities_template: ConfigValue<Option<PathBuf>>,
    /// JSON export read by `import`
    pub events_file: ConfigValue<Option<PathBuf>>,
    /// Append log output to this file as well as stderr
    pub log_file: ConfigValue<Option<PathBuf>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    table_name: Option<String>,
    events_dir: Option<PathBuf>,
    journals_dir: Option<PathBuf>,
    event_template: Option<PathBuf>,
    activities_template: Option<PathBuf>,
    events_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

pub const DEFAULT_TABLE_NAME: &str = "events";

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        // Start with defaults
        let mut config = Self {
            database_path: ConfigValue::new(data_dir.join("caljournal.db"), ConfigSource::Default),
            table_name: ConfigValue::new(DEFAULT_TABLE_NAME.to_string(), ConfigSource::Default),
            events_dir: ConfigValue::new(data_dir.join("events"), ConfigSource::Default),
            journals_dir: ConfigValue::new(data_dir.join("journals"), ConfigSource::Default),
            event_template: ConfigValue::new(None, ConfigSource::Default),
            activities_template: ConfigValue::new(None, ConfigSource::Default),
            events_file: ConfigValue::new(None, ConfigSource::Default),
            log_file: ConfigValue::new(None, ConfigSource::Default),
            config_file: None,
        };

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config.apply_file(file_config, &path);
            config.config_file = Some(path);
        }

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile, path: &Path) {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let resolve = |p: PathBuf| resolve_relative(base, p);

        if let Some(p) = file.database_path {
            self.database_path.set(resolve(p), ConfigSource::File);
        }
        if let Some(name) = file.table_name {
            self.table_name.set(name, ConfigSource::File);
        }
        if let Some(p) = file.events_dir {
            self.events_dir.set(resolve(p), ConfigSource::File);
        }
        if let Some(p) = file.journals_dir {
            self.journals_dir.set(resolve(p), ConfigSource::File);
        }
        if let Some(p) = file.event_template {
            self.event_template.set(Some(resolve(p)), ConfigSource::File);
        }
        if let Some(p) = file.activities_template {
            self.activities_template.set(Some(resolve(p)), ConfigSource::File);
        }
        if let Some(p) = file.events_file {
            self.events_file.set(Some(resolve(p)), ConfigSource::File);
        }
        if let Some(p) = file.log_file {
            self.log_file.set(Some(resolve(p)), ConfigSource::File);
        }
    }

    /// Apply environment variable overrides, reading variables through `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let env = ConfigSource::Environment;

        if let Some(p) = var("CALJOURNAL_DATABASE_PATH") {
            self.database_path.set(PathBuf::from(p), env.clone());
        }
        if let Some(name) = var("CALJOURNAL_TABLE_NAME") {
            self.table_name.set(name, env.clone());
        }
        if let Some(p) = var("CALJOURNAL_EVENTS_DIR") {
            self.events_dir.set(PathBuf::from(p), env.clone());
        }
        if let Some(p) = var("CALJOURNAL_JOURNALS_DIR") {
            self.journals_dir.set(PathBuf::from(p), env.clone());
        }
        if let Some(p) = var("CALJOURNAL_EVENT_TEMPLATE") {
            self.event_template.set(Some(PathBuf::from(p)), env.clone());
        }
        if let Some(p) = var("CALJOURNAL_ACTIVITIES_TEMPLATE") {
            self.activities_template.set(Some(PathBuf::from(p)), env.clone());
        }
        if let Some(p) = var("CALJOURNAL_EVENTS_FILE") {
            self.events_file.set(Some(PathBuf::from(p)), env.clone());
        }
        if let Some(p) = var("CALJOURNAL_LOG_FILE") {
            self.log_file.set(Some(PathBuf::from(p)), env);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !crate::db::is_identifier(&self.table_name.value) {
            return Err(ConfigError::InvalidTableName(self.table_name.value.clone()));
        }
        Ok(())
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/caljournal/
    /// - macOS: ~/Library/Application Support/caljournal/
    /// - Windows: %APPDATA%/caljournal/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caljournal")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/caljournal/
    /// - macOS: ~/Library/Application Support/caljournal/
    /// - Windows: %APPDATA%/caljournal/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caljournal")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidTableName(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidTableName(name) => {
                write!(f, "Invalid table_name '{}': use letters, digits and '_'", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidTableName(_) => None,
        }
    }
}
