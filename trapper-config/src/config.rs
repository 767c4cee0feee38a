use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trapper_log::{Level, LogConfig};
use trapper_sender::{SenderConfig, SenderRegistry};

/// Defines the source of a config error
#[derive(Debug, Default)]
enum ConfigErrorSource {
    /// An error occurring independently.
    #[default]
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field override (an env var, or a CLI parameter).
    FieldOverride(String),
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    source: ConfigErrorSource,
    kind: ConfigErrorKind,
    cause: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    #[inline]
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            source: ConfigErrorSource::None,
            kind,
            cause: None,
        }
    }

    #[inline]
    fn wrap<E>(inner: E, kind: ConfigErrorKind) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            cause: Some(Box::new(inner)),
            ..Self::new(kind)
        }
    }

    #[inline]
    fn for_field<E>(inner: E, field: &'static str) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap(inner, ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn file<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.source = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    #[inline]
    fn field(mut self, name: &str) -> Self {
        self.source = ConfigErrorSource::FieldOverride(name.to_owned());
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ConfigErrorSource::None => fmt::Display::fmt(&self.kind, f),
            ConfigErrorSource::File(file_name) => {
                write!(f, "{} (file {})", self.kind, file_name.display())
            }
            ConfigErrorSource::FieldOverride(name) => write!(f, "{} (field {})", self.kind, name),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Indicates config related errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Failed to serialize the configuration.
    #[error("could not write config")]
    CouldNotWriteFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Parsing JSON failed.
    #[error("could not parse json config")]
    BadJson,
    /// Invalid config value.
    #[error("invalid config value")]
    InvalidValue,
    /// An enabled sender has no server address.
    #[error("missing server address")]
    MissingServerAddress,
}

/// Error raised when a boolean override is neither true nor false.
#[derive(Debug, thiserror::Error)]
#[error("expected true or false, got '{0}'")]
struct ParseBoolError(String);

fn parse_bool(value: &str) -> Result<bool, ParseBoolError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ParseBoolError(value.to_owned())),
    }
}

/// Structure used to hold information about configuration overrides via
/// CLI parameters or environment variables
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverridableConfig {
    /// The address of the default server.
    pub server: Option<String>,
    /// The port of the default server.
    pub port: Option<String>,
    /// "true" if sending is disabled, "false" otherwise.
    pub disable: Option<String>,
    /// The log level.
    pub log_level: Option<String>,
    /// Name of the sender that server, port and disable overrides apply to.
    ///
    /// Falls back to the `sender` section if unset or if no section with this name exists under
    /// `senders`.
    pub instance: Option<String>,
}

impl OverridableConfig {
    /// Reads overrides from the `TRAPPER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`, which resolves an environment variable name.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self {
            server: lookup("TRAPPER_SERVER"),
            port: lookup("TRAPPER_PORT"),
            disable: lookup("TRAPPER_DISABLE"),
            log_level: lookup("TRAPPER_LOG_LEVEL"),
            instance: None,
        }
    }

    /// Fills every unset value from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            server: self.server.or(fallback.server),
            port: self.port.or(fallback.port),
            disable: self.disable.or(fallback.disable),
            log_level: self.log_level.or(fallback.log_level),
            instance: self.instance.or(fallback.instance),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct ConfigValues {
    sender: SenderConfig,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    senders: BTreeMap<String, SenderConfig>,
    logging: LogConfig,
}

/// Config struct.
///
/// Holds the settings of the default sender, additional named senders and the logging system.
#[derive(Clone, Default)]
pub struct Config {
    values: ConfigValues,
    path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

impl Config {
    /// Loads a config from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let f = fs::File::open(path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(path))?;

        let values = serde_yaml::from_reader(io::BufReader::new(f))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(path))?;

        Ok(Config {
            values,
            path: path.to_path_buf(),
        })
    }

    /// Creates a config from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        Ok(Config {
            values: serde_yaml::from_str(yaml)
                .map_err(|err| ConfigError::wrap(err, ConfigErrorKind::BadYaml))?,
            path: PathBuf::new(),
        })
    }

    /// Creates a config from a JSON value.
    ///
    /// This is mostly useful for tests.
    pub fn from_json_value(value: serde_json::Value) -> Result<Config, ConfigError> {
        Ok(Config {
            values: serde_json::from_value(value)
                .map_err(|err| ConfigError::wrap(err, ConfigErrorKind::BadJson))?,
            path: PathBuf::new(),
        })
    }

    /// Override configuration with values coming from other sources (e.g. env variables or
    /// command line parameters)
    pub fn apply_override(
        &mut self,
        overrides: OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        let values = &mut self.values;
        let named = match overrides.instance.as_deref() {
            Some(name) => values.senders.get_mut(name),
            None => None,
        };
        let sender = match named {
            Some(sender) => sender,
            None => &mut values.sender,
        };

        if let Some(server) = overrides.server {
            sender.server_address = server;
        }

        if let Some(port) = overrides.port {
            sender.server_port = port
                .trim()
                .parse()
                .map_err(|err| ConfigError::for_field(err, "port"))?;
        }

        if let Some(disable) = overrides.disable {
            sender.disable =
                parse_bool(&disable).map_err(|err| ConfigError::for_field(err, "disable"))?;
        }

        if let Some(level) = overrides.log_level {
            self.values.logging.level = level
                .parse::<Level>()
                .map_err(|err| ConfigError::for_field(err, "log_level"))?;
        }

        Ok(self)
    }

    /// Checks that every enabled sender has a server address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let default = std::iter::once(("sender".to_owned(), &self.values.sender));
        let named = self
            .values
            .senders
            .iter()
            .map(|(name, config)| (format!("senders.{name}"), config));

        for (field, config) in default.chain(named) {
            if !config.disable && config.server_address.trim().is_empty() {
                return Err(ConfigError::new(ConfigErrorKind::MissingServerAddress)
                    .field(&format!("{field}.server_address")));
            }
        }

        Ok(())
    }

    /// Builds a registry of the configured senders.
    ///
    /// The `sender` section configures the default instance and every instance without a
    /// dedicated section under `senders`.
    pub fn registry(&self) -> Result<SenderRegistry, ConfigError> {
        self.validate()?;

        let mut registry = SenderRegistry::new(self.values.sender.clone());
        for (name, config) in &self.values.senders {
            registry = registry.with_config(name.clone(), config.clone());
        }

        Ok(registry)
    }

    /// Serializes the effective configuration to YAML.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.values)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// Returns the path of the file this config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        Some(self.path.as_path()).filter(|p| !p.as_os_str().is_empty())
    }

    /// Returns the configuration of the default sender.
    pub fn sender(&self) -> &SenderConfig {
        &self.values.sender
    }

    /// Returns the configurations of the named senders.
    pub fn senders(&self) -> &BTreeMap<String, SenderConfig> {
        &self.values.senders
    }

    /// Returns the logging configuration.
    pub fn logging(&self) -> &LogConfig {
        &self.values.logging
    }
}
