//! Level plan module - the in-memory level description the world is built from
//!
//! A plan is the parsed form of a level file: a symbol legend and rows of
//! symbols. Parsing the file format itself lives outside the core; this module
//! only validates a plan and turns it into entity placements.

use std::collections::BTreeMap;

use crate::error::LevelError;
use crate::types::{Cell, EntityKind, COUNTDOWN_MAX_SECS};

/// Definition of one legend symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDef {
    pub role: String,
    pub group: Option<String>,
}

impl SymbolDef {
    pub fn role(role: &str) -> Self {
        Self {
            role: role.to_string(),
            group: None,
        }
    }

    pub fn grouped(role: &str, group: &str) -> Self {
        Self {
            role: role.to_string(),
            group: Some(group.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        self.role.eq_ignore_ascii_case("empty")
    }
}

/// One entity to create at level start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub cell: Cell,
    pub kind: EntityKind,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPlan {
    pub name: String,
    /// Countdown budget in seconds
    pub countdown: u32,
    pub rows: Vec<String>,
    pub legend: BTreeMap<char, SymbolDef>,
}

impl LevelPlan {
    /// Create a plan using the standard legend
    ///
    /// | Symbol | Role |
    /// |--------|------|
    /// | ` ` | empty |
    /// | `#` | wall |
    /// | `.` | earth |
    /// | `P` | player |
    /// | `o` | rock |
    /// | `*` | diamond |
    /// | `r` | rockdiamond |
    /// | `=` | barrier |
    /// | `T` | treasure |
    /// | `W` | trophy |
    /// | `K` | goldenkey |
    /// | `Z` | zombie |
    /// | `u` | pudiamond |
    /// | `z` | zdiamond |
    pub fn new(name: &str, rows: &[&str]) -> Self {
        let legend = [
            (' ', "empty"),
            ('#', "wall"),
            ('.', "earth"),
            ('P', "player"),
            ('o', "rock"),
            ('*', "diamond"),
            ('r', "rockdiamond"),
            ('=', "barrier"),
            ('T', "treasure"),
            ('W', "trophy"),
            ('K', "goldenkey"),
            ('Z', "zombie"),
            ('u', "pudiamond"),
            ('z', "zdiamond"),
        ]
        .into_iter()
        .map(|(symbol, role)| (symbol, SymbolDef::role(role)))
        .collect();

        Self {
            name: name.to_string(),
            countdown: COUNTDOWN_MAX_SECS,
            rows: rows.iter().map(|r| r.to_string()).collect(),
            legend,
        }
    }

    /// Create a plan with an empty legend
    pub fn bare(name: &str, rows: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            countdown: COUNTDOWN_MAX_SECS,
            rows,
            legend: BTreeMap::new(),
        }
    }

    pub fn with_countdown(mut self, seconds: u32) -> Self {
        self.countdown = seconds;
        self
    }

    pub fn define(mut self, symbol: char, def: SymbolDef) -> Self {
        self.legend.insert(symbol, def);
        self
    }

    /// Grid dimensions `(rows, cols)`; ragged rows are padded with empty cells
    pub fn dimensions(&self) -> (i32, i32) {
        let cols = self
            .rows
            .iter()
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(0);
        (self.rows.len() as i32, cols as i32)
    }

    /// Countdown in seconds, defaulted and capped
    pub fn countdown_secs(&self) -> u32 {
        match self.countdown {
            0 => COUNTDOWN_MAX_SECS,
            n => n.min(COUNTDOWN_MAX_SECS),
        }
    }

    /// Validate the plan and list the entities it creates, row-major
    pub fn placements(&self) -> Result<Vec<Placement>, LevelError> {
        let (rows, cols) = self.dimensions();
        if rows == 0 || cols == 0 {
            return Err(LevelError::EmptyMatrix);
        }

        let mut out = Vec::new();
        let mut players = 0;
        for (row, line) in self.rows.iter().enumerate() {
            for (col, symbol) in line.chars().enumerate() {
                let cell = Cell::new(row as i32, col as i32);
                let def = self
                    .legend
                    .get(&symbol)
                    .ok_or(LevelError::UndefinedSymbol { symbol, cell })?;
                if def.is_empty() {
                    continue;
                }
                let kind =
                    EntityKind::from_role(&def.role).ok_or_else(|| LevelError::UnknownRole {
                        symbol,
                        role: def.role.clone(),
                    })?;
                if kind == EntityKind::Player {
                    players += 1;
                }
                out.push(Placement {
                    cell,
                    kind,
                    group: def.group.clone(),
                });
            }
        }

        match players {
            0 => Err(LevelError::MissingPlayer),
            1 => Ok(out),
            _ => Err(LevelError::MultiplePlayers),
        }
    }

    /// Number of goal diamonds the plan places
    pub fn goal(&self) -> Result<u32, LevelError> {
        Ok(self
            .placements()?
            .iter()
            .filter(|p| p.kind.counts_toward_goal())
            .count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_legend_placements() {
        let plan = LevelPlan::new("t", &["#P*", "o. "]);
        let placements = plan.placements().unwrap();
        let kinds: Vec<_> = placements.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Wall,
                EntityKind::Player,
                EntityKind::Diamond,
                EntityKind::Rock,
                EntityKind::Earth
            ]
        );
        assert_eq!(placements[2].cell, Cell::new(0, 2));
        assert_eq!(plan.dimensions(), (2, 3));
    }

    #[test]
    fn test_goal_counts_every_diamond_role() {
        let plan = LevelPlan::new("t", &["P*ruzK"]);
        assert_eq!(plan.goal().unwrap(), 4);
    }

    #[test]
    fn test_undefined_symbol() {
        let plan = LevelPlan::new("t", &["P?"]);
        assert_eq!(
            plan.placements(),
            Err(LevelError::UndefinedSymbol {
                symbol: '?',
                cell: Cell::new(0, 1)
            })
        );
    }

    #[test]
    fn test_unknown_role() {
        let plan = LevelPlan::new("t", &["P~"]).define('~', SymbolDef::role("lava"));
        assert!(matches!(
            plan.placements(),
            Err(LevelError::UnknownRole { symbol: '~', .. })
        ));
    }

    #[test]
    fn test_player_count_is_validated() {
        assert_eq!(
            LevelPlan::new("t", &["*"]).placements(),
            Err(LevelError::MissingPlayer)
        );
        assert_eq!(
            LevelPlan::new("t", &["PP"]).placements(),
            Err(LevelError::MultiplePlayers)
        );
        assert_eq!(
            LevelPlan::new("t", &[]).placements(),
            Err(LevelError::EmptyMatrix)
        );
    }

    #[test]
    fn test_countdown_default_and_cap() {
        let plan = LevelPlan::new("t", &["P"]);
        assert_eq!(plan.clone().with_countdown(0).countdown_secs(), 600);
        assert_eq!(plan.clone().with_countdown(90).countdown_secs(), 90);
        assert_eq!(plan.with_countdown(5000).countdown_secs(), 600);
    }

    #[test]
    fn test_grouped_symbols_carry_group() {
        let plan = LevelPlan::new("t", &["P%"]).define('%', SymbolDef::grouped("barrier", "gate"));
        let placements = plan.placements().unwrap();
        assert_eq!(placements[1].group.as_deref(), Some("gate"));
    }
}
