use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tui_boulder_core::{LevelError, LevelPlan, SymbolDef};
use tui_boulder_types::COUNTDOWN_MAX_SECS;

#[derive(Debug, Error)]
pub enum LevelFileError {
    #[error("cannot read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed level file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("symbol key {0:?} must be exactly one character")]
    BadSymbol(String),
    #[error(transparent)]
    Level(#[from] LevelError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDefFile {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFile {
    pub level_name: String,
    /// Seconds; 0 or missing means the default budget
    #[serde(default = "default_countdown")]
    pub countdown: u32,
    pub defs: BTreeMap<String, SymbolDefFile>,
    pub matrix: Vec<String>,
}

fn default_countdown() -> u32 {
    COUNTDOWN_MAX_SECS
}

impl LevelFile {
    pub fn from_json(text: &str) -> Result<Self, LevelFileError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self, LevelFileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Convert into a validated plan
    pub fn into_plan(self) -> Result<LevelPlan, LevelFileError> {
        let mut plan = LevelPlan::bare(&self.level_name, self.matrix).with_countdown(self.countdown);
        for (key, def) in self.defs {
            let mut chars = key.chars();
            let (Some(symbol), None) = (chars.next(), chars.next()) else {
                return Err(LevelFileError::BadSymbol(key));
            };
            plan = plan.define(
                symbol,
                SymbolDef {
                    role: def.role,
                    group: def.group,
                },
            );
        }
        plan.placements()?;
        Ok(plan)
    }
}
