//! Loader for crosspost configuration with YAML + environment overlays.
//!
//! Every key is optional. Precedence, lowest to highest: built-in defaults, the
//! YAML file, `CROSSPOST_`-prefixed environment variables (`__` separates nested
//! keys, so `CROSSPOST_HTTP__TIMEOUT_SECS=5` sets `http.timeout_secs`). String values
//! may reference other environment variables as `${VAR}`.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const APP_DIR: &str = "crosspost";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrosspostConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub version: Option<String>,
    pub store: StoreSettings,
    pub http: HttpSettings,
    pub profiles: ProfileSettings,
    pub logging: LoggingSettings,
}

/// Where registered sessions are persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub dir: Option<PathBuf>,
}

impl StoreSettings {
    /// Configured directory with `~` expanded, or `<data dir>/crosspost`.
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => expand_tilde(dir),
            None => dirs::data_local_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Profile lookups in flight at once. 1 keeps them strictly sequential.
    pub concurrency: usize,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `text` or `json`.
    pub format: String,
    pub dir: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: "text".into(),
            dir: None,
            filter: "info".into(),
            stderr: false,
        }
    }
}

/// `<config dir>/crosspost/crosspost.yaml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("crosspost.yaml"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

// YAML happily reads `version: 1` as a number.
fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct CrosspostConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CrosspostConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosspostConfigLoader {
    /// Start with no sources; `CROSSPOST_` env overrides are layered on in [`load`](Self::load).
    ///
    /// ```
    /// use crosspost_config::CrosspostConfigLoader;
    ///
    /// let config = CrosspostConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.http.timeout_secs, 30);
    /// assert_eq!(config.profiles.concurrency, 1);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use crosspost_config::CrosspostConfigLoader;
    ///
    /// let cfg = CrosspostConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// store:
    ///   dir: /tmp/crosspost-doc
    /// logging:
    ///   format: json
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.store.resolved_dir(), std::path::PathBuf::from("/tmp/crosspost-doc"));
    /// assert_eq!(cfg.logging.format, "json");
    /// assert_eq!(cfg.logging.filter, "info");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into typed config,
    /// expanding `${VAR}` placeholders first.
    ///
    /// The environment is added last so it beats every file.
    pub fn load(self) -> Result<CrosspostConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CROSSPOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
