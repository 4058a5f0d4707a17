//! Deployment configuration
//!
//! Everything comes from the environment (optionally via a `.env` file loaded
//! in `main`). Missing collaborator settings are not errors: the matching
//! service is replaced by one that always fails, so its flow answers with a
//! failure message instead of taking the bot down.

use crate::db::{ContentSeed, UserId};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown platform {0:?} (expected \"vk\" or \"tg\")")]
    UnknownPlatform(String),
    #[error("Invalid port {0:?}")]
    InvalidPort(String),
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed content file {path}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Chat platform served by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    Vk,
    Tg,
}

impl Platform {
    /// Table and keyboard-file prefix
    pub fn prefix(self) -> &'static str {
        match self {
            Platform::Vk => "vk",
            Platform::Tg => "tg",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vk" => Ok(Platform::Vk),
            "tg" | "telegram" => Ok(Platform::Tg),
            _ => Err(ConfigError::UnknownPlatform(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub platform: Platform,
    pub admins: HashSet<UserId>,
    pub db_path: PathBuf,
    pub port: u16,
    /// Root of links/, schedule/, keyboards/, filter.txt, content.json, graphs/
    pub data_dir: PathBuf,
    pub wolfram_app_id: Option<String>,
    /// Reply to "остальные материалы"
    pub other_materials: Option<String>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let platform = var("BOT_PLATFORM").map_or(Ok(Platform::default()), |p| p.parse::<Platform>())?;

        let port = match var("BOT_PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => 8000,
        };

        let data_dir = var("BOT_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from);

        let db_path = var("BOT_DB_PATH").map_or_else(|| data_dir.join("campus_bot.db"), PathBuf::from);

        Ok(Self {
            platform,
            admins: var("BOT_ADMINS").map(|a| parse_admins(&a)).unwrap_or_default(),
            db_path,
            port,
            data_dir,
            wolfram_app_id: var("WOLFRAM_APP_ID"),
            other_materials: var("BOT_OTHER_MATERIALS"),
        })
    }

    pub fn links_dir(&self) -> PathBuf {
        self.data_dir.join("links")
    }

    pub fn schedule_dir(&self) -> PathBuf {
        self.data_dir.join("schedule")
    }

    pub fn keyboards_dir(&self) -> PathBuf {
        self.data_dir.join("keyboards")
    }

    pub fn filter_path(&self) -> PathBuf {
        self.data_dir.join("filter.txt")
    }

    pub fn content_path(&self) -> PathBuf {
        self.data_dir.join("content.json")
    }

    pub fn graphs_dir(&self) -> PathBuf {
        self.data_dir.join("graphs")
    }
}

fn parse_admins(list: &str) -> HashSet<UserId> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(UserId::from)
        .collect()
}

/// Load the built-in answers file. A missing file is an empty seed.
pub fn load_content(path: &Path) -> Result<ContentSeed, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ContentSeed::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::Content {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        BotConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.platform, Platform::Vk);
        assert_eq!(cfg.port, 8000);
        assert!(cfg.admins.is_empty());
        assert_eq!(cfg.db_path, PathBuf::from("data/campus_bot.db"));
        assert_eq!(cfg.other_materials, None);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("BOT_PLATFORM", "TG"),
            ("BOT_PORT", "9100"),
            ("BOT_ADMINS", " 12, 34 ,,"),
            ("BOT_DATA_DIR", "/srv/bot"),
            ("WOLFRAM_APP_ID", "  "),
        ])
        .unwrap();
        assert_eq!(cfg.platform, Platform::Tg);
        assert_eq!(cfg.port, 9100);
        assert!(cfg.admins.contains(&UserId::from("12")));
        assert!(cfg.admins.contains(&UserId::from("34")));
        assert_eq!(cfg.admins.len(), 2);
        assert_eq!(cfg.db_path, PathBuf::from("/srv/bot/campus_bot.db"));
        assert_eq!(cfg.filter_path(), PathBuf::from("/srv/bot/filter.txt"));
        assert_eq!(cfg.wolfram_app_id, None);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(matches!(
            config(&[("BOT_PLATFORM", "irc")]),
            Err(ConfigError::UnknownPlatform(_))
        ));
        assert!(matches!(config(&[("BOT_PORT", "http")]), Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn test_load_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        assert_eq!(load_content(&path).unwrap(), ContentSeed::default());

        std::fs::write(&path, r#"{"photos": {"кот": "https://example.org/cat.jpg"}}"#).unwrap();
        assert_eq!(load_content(&path).unwrap().photos.len(), 1);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_content(&path), Err(ConfigError::Content { .. })));
    }
}
