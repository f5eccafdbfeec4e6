use std::path::{Path, PathBuf};

use tui_boulder_core::{LevelPlan, LevelSource, SourceError};

use crate::file::LevelFile;

/// `level_{n}.json` files in one directory
#[derive(Debug, Clone)]
pub struct LevelDirectory {
    root: PathBuf,
}

impl LevelDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, level: u32) -> PathBuf {
        self.root.join(format!("level_{level}.json"))
    }

    /// Number of consecutive levels available from level 1
    pub fn count(&self) -> u32 {
        (1..).take_while(|n| self.path_of(*n).is_file()).count() as u32
    }
}

impl LevelSource for LevelDirectory {
    fn load(&self, level: u32) -> Result<Option<LevelPlan>, SourceError> {
        let path = self.path_of(level);
        if !path.is_file() {
            return Ok(None);
        }
        let plan = LevelFile::read(&path)?.into_plan()?;
        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("boulder-levels-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_numbered_files() {
        let dir = scratch_dir("numbered");
        std::fs::write(
            dir.join("level_1.json"),
            r#"{"level_name":"one","defs":{"P":{"role":"player"},"*":{"role":"diamond"}},"matrix":["P*"]}"#,
        )
        .unwrap();

        let levels = LevelDirectory::new(&dir);
        assert_eq!(levels.count(), 1);
        let plan = levels.load(1).unwrap().unwrap();
        assert_eq!(plan.name, "one");
        assert!(levels.load(2).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = scratch_dir("broken");
        std::fs::write(dir.join("level_1.json"), "not json").unwrap();
        let levels = LevelDirectory::new(&dir);
        let err = levels.load(1).unwrap_err();
        assert!(err.to_string().contains("malformed"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shipped_levels_are_valid() {
        let levels = LevelDirectory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../levels"));
        assert!(levels.count() >= 1);
        for n in 1..=levels.count() {
            assert!(levels.load(n).unwrap().is_some(), "level {n}");
        }
    }
}
