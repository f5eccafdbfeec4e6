//! Runtime configuration from `BOULDER_*` environment variables.
//!
//! The remote control adapter reads its own `BOULDER_AI_*` variables, see
//! [`crate::adapter::ServerConfig::from_env`].

use std::path::PathBuf;

use log::LevelFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Directory holding `level_<n>.json` files
    pub levels_dir: PathBuf,
    pub start_level: u32,
    pub seed: u32,
    /// Best-score file; `None` keeps the best score in memory only
    pub scores_path: Option<PathBuf>,
    /// Log file; `None` disables logging
    pub log_path: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            levels_dir: PathBuf::from("levels"),
            start_level: 1,
            seed: 1,
            scores_path: None,
            log_path: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; unset, blank or unparsable values
    /// fall back to the defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            var(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Self {
            levels_dir: value("BOULDER_LEVELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.levels_dir),
            start_level: value("BOULDER_START_LEVEL")
                .and_then(|s| s.parse().ok())
                .filter(|&n| n >= 1)
                .unwrap_or(defaults.start_level),
            seed: value("BOULDER_SEED")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seed),
            scores_path: value("BOULDER_SCORES_PATH").map(PathBuf::from),
            log_path: value("BOULDER_LOG_PATH").map(PathBuf::from),
            log_level: value("BOULDER_LOG_LEVEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> GameConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GameConfig::from_vars(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config(&[]), GameConfig::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let c = config(&[
            ("BOULDER_LEVELS_DIR", "/tmp/mines"),
            ("BOULDER_START_LEVEL", "3"),
            ("BOULDER_SEED", "42"),
            ("BOULDER_SCORES_PATH", "best.json"),
            ("BOULDER_LOG_PATH", "game.log"),
            ("BOULDER_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(c.levels_dir, PathBuf::from("/tmp/mines"));
        assert_eq!(c.start_level, 3);
        assert_eq!(c.seed, 42);
        assert_eq!(c.scores_path, Some(PathBuf::from("best.json")));
        assert_eq!(c.log_path, Some(PathBuf::from("game.log")));
        assert_eq!(c.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let c = config(&[
            ("BOULDER_START_LEVEL", "0"),
            ("BOULDER_SEED", "many"),
            ("BOULDER_SCORES_PATH", "  "),
            ("BOULDER_LOG_LEVEL", "loud"),
        ]);
        assert_eq!(c.start_level, 1);
        assert_eq!(c.seed, 1);
        assert_eq!(c.scores_path, None);
        assert_eq!(c.log_level, LevelFilter::Info);
    }
}
