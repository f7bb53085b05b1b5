//! Turns loaded configuration into the pieces every command needs.
use anyhow::{Context, Result};
use crosspost_common::CrosspostError;
use crosspost_common::observability::{LogConfig, LogFormat};
use crosspost_config::{
    CrosspostConfig, CrosspostConfigLoader, LoggingSettings, default_config_path,
};
use crosspost_social::Gateway;
use crosspost_store::{FileStorage, SessionStore};
use std::path::Path;
use std::time::Duration;

/// An explicit path must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> Result<CrosspostConfig> {
    let loader = CrosspostConfigLoader::new();
    let loader = match (path, default_config_path()) {
        (Some(explicit), _) => loader.with_file(explicit),
        (None, Some(default)) => loader.with_optional_file(default),
        (None, None) => loader,
    };
    loader.load().context("failed to load configuration")
}

/// Stderr output is suppressed while the terminal form owns the screen.
pub fn log_config(settings: &LoggingSettings, interactive: bool) -> Result<LogConfig, CrosspostError> {
    let format = LogFormat::parse(&settings.format).ok_or_else(|| {
        CrosspostError::Config(format!(
            "logging.format must be `text` or `json`, got `{}`",
            settings.format
        ))
    })?;
    Ok(LogConfig {
        log_dir: settings.dir.clone(),
        emit_stderr: settings.stderr && !interactive,
        format,
        default_filter: settings.filter.clone(),
        ..LogConfig::default()
    })
}

pub fn gateway(cfg: &CrosspostConfig) -> Gateway {
    Gateway::new(Duration::from_secs(cfg.http.timeout_secs))
        .with_profile_concurrency(cfg.profiles.concurrency)
}

pub fn open_store(cfg: &CrosspostConfig) -> Result<SessionStore<FileStorage>> {
    let dir = cfg.store.resolved_dir();
    let store = SessionStore::open(FileStorage::new(&dir))
        .with_context(|| format!("failed to open session store in {}", dir.display()))?;
    tracing::debug!(dir = %dir.display(), accounts = store.sessions().len(), "store.open");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_store::KeyValueStorage;

    #[test]
    fn interactive_runs_never_log_to_stderr() {
        let settings = LoggingSettings {
            stderr: true,
            format: "JSON".into(),
            ..LoggingSettings::default()
        };
        let cli = log_config(&settings, false).unwrap();
        assert!(cli.emit_stderr);
        assert_eq!(cli.format, LogFormat::Json);
        assert!(!log_config(&settings, true).unwrap().emit_stderr);
    }

    #[test]
    fn unknown_log_format_is_a_config_error() {
        let settings = LoggingSettings {
            format: "yaml".into(),
            ..LoggingSettings::default()
        };
        assert!(matches!(
            log_config(&settings, false),
            Err(CrosspostError::Config(msg)) if msg.contains("yaml")
        ));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn store_opens_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CrosspostConfigLoader::new()
            .with_yaml_str(&format!("store:\n  dir: {}\n", dir.path().display()))
            .load()
            .unwrap();
        let store = open_store(&cfg).unwrap();
        assert!(store.sessions().is_empty());
        assert_eq!(store.storage().dir(), dir.path());
        assert_eq!(store.storage().get("session").unwrap(), None);
    }
}
