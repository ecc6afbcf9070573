use directories::ProjectDirs;
use doughnut::ChartConfig;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "doughnut", "doughnut").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(false))
        .add_source(environment())
        .build()?;

    Ok(s.try_deserialize()?)
}

/// `DOUGHNUT__CHART__RADIUS=80` overrides `[chart] radius`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("DOUGHNUT").separator("__")
}

/// Loads `path`, writing the default config there on first run. Falls back
/// to the built-in defaults when the file cannot be read.
pub fn load_or_default(path: &Path) -> Config {
    if !path.exists() {
        match write_default_config(path) {
            Ok(()) => log::info!("Wrote default config to {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
    }

    match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config, using defaults: {}", e);
            default_config()
        }
    }
}

pub fn default_config() -> Config {
    parse_config(DEFAULT_CONFIG).unwrap_or_default()
}

fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    Ok(s.try_deserialize()?)
}

pub fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(path, DEFAULT_CONFIG)?;
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>, config_path: PathBuf) {
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", ConfigError::from(e));
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doughnut::SurfaceKind;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.chart.values, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(config.chart.active, Some(0));
        assert_eq!(config.chart.duration, Duration::from_millis(600));
        assert_eq!(config.chart.surface, SurfaceKind::Buffered);
        assert_eq!(config.chart.border_colors[1].to_string(), "#fe4e75");
        assert!(config.chart.validate().is_ok());
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config = parse_config("[chart]\nvalues = [50, 50]\nsurface = \"2d\"\n").unwrap();
        assert_eq!(config.chart.values, vec![50.0, 50.0]);
        assert_eq!(config.chart.surface, SurfaceKind::Native);
        assert_eq!(config.chart.radius, 65.0);
        assert_eq!(config.chart.active, None);

        let empty = parse_config("").unwrap();
        assert!(empty.chart.values.is_empty());
    }

    #[test]
    fn test_environment_overrides_chart_keys() {
        let vars = [
            ("DOUGHNUT__CHART__RADIUS", "80"),
            ("DOUGHNUT_CHART__BORDER", "10"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.chart.radius, 80.0);
        assert_eq!(config.chart.border, 32.0);
    }
}
