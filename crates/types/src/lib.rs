//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the game.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (simulation core, terminal rendering, remote control).
//!
//! # Coordinates
//!
//! The mine is a grid of cells addressed by `(row, col)`:
//!
//! - **Row 0** is the top of the mine, rows grow downward
//! - **Column 0** is the left edge, columns grow rightward
//! - Pixel coordinates (used by renderers that draw tiles) map one cell to
//!   [`CELL_SIZE`] x [`CELL_SIZE`] pixels
//!
//! # Simulation Timing Constants
//!
//! Timing values are in milliseconds of simulation clock:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Frame loop interval (~60 FPS) |
//! | `FALL_START_DELAY_MS` | 150 | Delay before a loose object starts falling |
//! | `FALL_STEP_MS` | 100 | Interval between two cells of free fall |
//! | `FALL_SWEEP_MS` | 200 | Interval of the "wake every loose object" sweep |
//! | `COUNTDOWN_STEP_MS` | 1000 | Countdown decrement cadence |
//! | `ENEMY_STEP_MS` | 800 | Zombie decision cadence |
//! | `ENEMY_IDLE_MS` | 500 | Walking/attacking pose before returning to idle |
//! | `UNLOCK_DELAY_MS` | 500 | Delay before a gated object opens |
//! | `TRANSFORM_MS` | 400 | Rock-diamond "changing" sequence |
//! | `SPLASH_MS` | 600 | Player crushed sequence before death |
//! | `DYING_MS` | 600 | Zombie dying sequence before removal |
//! | `LEVEL_WON_DELAY_MS` | 4000 | Pause between a won level and the next one |
//! | `GAME_OVER_DELAY_MS` | 3000 | Pause between player death and game over |
//!
//! # Scoring
//!
//! | Event | Points |
//! |-------|--------|
//! | Diamond / rock-diamond collected | 200 |
//! | Prize-unlocker / zombie-killer diamond collected | 500 |
//! | Golden key collected | 500 |
//! | Treasure collected | 1000 |
//! | Trophy collected | 5000 |
//! | Trophy opened | 1000 |
//! | Earth digged | 50 |
//! | Rock turned into diamond | 100 |
//! | Zombie killed | 100 |
//!
//! # Examples
//!
//! ```
//! use tui_boulder_types::{Cell, Direction, EntityKind, GameAction};
//!
//! // Cells move by direction
//! let cell = Cell::new(2, 3);
//! assert_eq!(cell.step(Direction::Down), Cell::new(3, 3));
//!
//! // Roles from level files map to entity kinds
//! assert_eq!(EntityKind::from_role("rock"), Some(EntityKind::Rock));
//! assert_eq!(EntityKind::Rock.name(), "Rock");
//!
//! // Parse game action
//! let action = GameAction::from_str("moveLeft").unwrap();
//! assert_eq!(action.direction(), Some(Direction::Left));
//! ```

/// Frame loop interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Edge length of one cell in pixel space.
pub const CELL_SIZE: i32 = 64;

/// Delay between a "fall down" request and the first fall step.
pub const FALL_START_DELAY_MS: u32 = 150;

/// Interval between two consecutive fall steps of one object.
pub const FALL_STEP_MS: u32 = 100;

/// Interval of the sweep that wakes every loose object.
pub const FALL_SWEEP_MS: u32 = 200;

/// Countdown decrement cadence (one second).
pub const COUNTDOWN_STEP_MS: u32 = 1000;

/// Countdown budget used when a level does not state one, and the upper cap.
pub const COUNTDOWN_MAX_SECS: u32 = 600;

/// Countdown alarm threshold in seconds.
pub const COUNTDOWN_ALARM_SECS: u32 = 10;

/// Zombie decision cadence.
pub const ENEMY_STEP_MS: u32 = 800;

/// Zombie walking/attacking pose duration.
pub const ENEMY_IDLE_MS: u32 = 500;

/// Distance (in cells, along one axis) under which an aligned zombie may attack.
pub const ENEMY_ATTACK_RANGE: i32 = 2;

/// Attack probability in percent when a zombie is aligned with the player.
pub const ENEMY_ATTACK_CHANCE: u32 = 10;

/// Delay before a treasure or trophy opens once its unlock condition holds.
pub const UNLOCK_DELAY_MS: u32 = 500;

/// Duration of the rock-diamond "changing" sequence.
pub const TRANSFORM_MS: u32 = 400;

/// Duration of the player "splashed" sequence.
pub const SPLASH_MS: u32 = 600;

/// Duration of the zombie "dying" sequence.
pub const DYING_MS: u32 = 600;

/// Delay between the level-won transition and the next level.
pub const LEVEL_WON_DELAY_MS: u32 = 4000;

/// Delay between the player's death and the game-over screen.
pub const GAME_OVER_DELAY_MS: u32 = 3000;

/// Start-up delay of the falling sweep after a level starts.
pub const SWEEP_START_MS: u32 = 1200;

/// Start-up delay of the countdown after a level starts.
pub const COUNTDOWN_START_MS: u32 = 800;

/// Start-up delay of zombie loops after a level starts.
pub const ENEMY_START_MS: u32 = 1000;

/// Held-key delay before the player move repeats.
pub const MOVE_REPEAT_DELAY_MS: u32 = 180;

/// Interval of repeated player moves while a key is held.
pub const MOVE_REPEAT_MS: u32 = 120;

pub const SCORE_DIAMOND: u32 = 200;
pub const SCORE_SPECIAL_DIAMOND: u32 = 500;
pub const SCORE_GOLDEN_KEY: u32 = 500;
pub const SCORE_TREASURE: u32 = 1000;
pub const SCORE_TROPHY: u32 = 5000;
pub const SCORE_TROPHY_OPENED: u32 = 1000;
pub const SCORE_EARTH: u32 = 50;
pub const SCORE_ROCK_CHANGED: u32 = 100;
pub const SCORE_ZOMBIE_KILLED: u32 = 100;


/// A cell of the mine grid
///
/// Signed coordinates let neighbor arithmetic step outside the grid; bounds
/// are checked by the grid, never by the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The neighbor one cell away in `dir`
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_boulder_types::{Cell, Direction};
    ///
    /// assert_eq!(Cell::new(0, 0).step(Direction::Left), Cell::new(0, -1));
    /// ```
    pub fn step(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Self::new(self.row + dr, self.col + dc)
    }

    pub fn above(self) -> Self {
        self.step(Direction::Up)
    }

    pub fn below(self) -> Self {
        self.step(Direction::Down)
    }
}

/// The four move directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// `(row, col)` delta of one step
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Parse direction from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_boulder_types::Direction;
    ///
    /// assert_eq!(Direction::from_str("LEFT"), Some(Direction::Left));
    /// assert_eq!(Direction::from_str("north"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Corners of a cell in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Every kind of object the mine can hold
///
/// - **Player**: the miner, driven by move commands
/// - **Rock**: loose, pushable, crushes what it falls on
/// - **Diamond**: loose, collectable, counts toward the level goal
/// - **RockDiamond**: a rock that turns into a diamond when it lands on a rock
/// - **Earth**: diggable filler
/// - **Wall**: permanent blocker
/// - **Barrier**: blocker that falling objects may remove, optionally grouped
/// - **Treasure**: pushable prize, opened by the golden key
/// - **Trophy**: prize opened once every prize-unlocker diamond is collected
/// - **GoldenKey**: collectable that opens treasures
/// - **Zombie**: autonomous enemy, freezes the player on contact
/// - **PrizeDiamond**: diamond counted by trophies
/// - **KillerDiamond**: diamond whose collection kills a zombie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Player,
    Rock,
    Diamond,
    RockDiamond,
    Earth,
    Wall,
    Barrier,
    Treasure,
    Trophy,
    GoldenKey,
    Zombie,
    PrizeDiamond,
    KillerDiamond,
}

impl EntityKind {
    pub const ALL: [EntityKind; 13] = [
        EntityKind::Player,
        EntityKind::Rock,
        EntityKind::Diamond,
        EntityKind::RockDiamond,
        EntityKind::Earth,
        EntityKind::Wall,
        EntityKind::Barrier,
        EntityKind::Treasure,
        EntityKind::Trophy,
        EntityKind::GoldenKey,
        EntityKind::Zombie,
        EntityKind::PrizeDiamond,
        EntityKind::KillerDiamond,
    ];

    /// Parse a level-file role (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_boulder_types::EntityKind;
    ///
    /// assert_eq!(EntityKind::from_role("Diamond"), Some(EntityKind::Diamond));
    /// assert_eq!(EntityKind::from_role("zdiamond"), Some(EntityKind::KillerDiamond));
    /// assert_eq!(EntityKind::from_role("empty"), None);
    /// ```
    pub fn from_role(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "player" => Some(EntityKind::Player),
            "rock" => Some(EntityKind::Rock),
            "diamond" => Some(EntityKind::Diamond),
            "rockdiamond" => Some(EntityKind::RockDiamond),
            "earth" => Some(EntityKind::Earth),
            "wall" => Some(EntityKind::Wall),
            "barrier" | "syncbarrier" => Some(EntityKind::Barrier),
            "treasure" => Some(EntityKind::Treasure),
            "trophy" => Some(EntityKind::Trophy),
            "goldenkey" | "key" => Some(EntityKind::GoldenKey),
            "zombie" => Some(EntityKind::Zombie),
            "pudiamond" => Some(EntityKind::PrizeDiamond),
            "zdiamond" => Some(EntityKind::KillerDiamond),
            _ => None,
        }
    }

    /// Canonical level-file role
    pub fn role(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Rock => "rock",
            EntityKind::Diamond => "diamond",
            EntityKind::RockDiamond => "rockdiamond",
            EntityKind::Earth => "earth",
            EntityKind::Wall => "wall",
            EntityKind::Barrier => "barrier",
            EntityKind::Treasure => "treasure",
            EntityKind::Trophy => "trophy",
            EntityKind::GoldenKey => "goldenkey",
            EntityKind::Zombie => "zombie",
            EntityKind::PrizeDiamond => "pudiamond",
            EntityKind::KillerDiamond => "zdiamond",
        }
    }

    /// Name used in event topics (`Game:<name>:Collected`)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_boulder_types::EntityKind;
    ///
    /// assert_eq!(EntityKind::PrizeDiamond.name(), "PUDiamond");
    /// assert_eq!(EntityKind::GoldenKey.name(), "GoldenKey");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player => "Player",
            EntityKind::Rock => "Rock",
            EntityKind::Diamond => "Diamond",
            EntityKind::RockDiamond => "RockDiamond",
            EntityKind::Earth => "Earth",
            EntityKind::Wall => "Wall",
            EntityKind::Barrier => "Barrier",
            EntityKind::Treasure => "Treasure",
            EntityKind::Trophy => "Trophy",
            EntityKind::GoldenKey => "GoldenKey",
            EntityKind::Zombie => "Zombie",
            EntityKind::PrizeDiamond => "PUDiamond",
            EntityKind::KillerDiamond => "ZDiamond",
        }
    }

    /// Kinds whose collection decrements the level's diamond goal
    pub fn counts_toward_goal(&self) -> bool {
        matches!(
            self,
            EntityKind::Diamond
                | EntityKind::RockDiamond
                | EntityKind::PrizeDiamond
                | EntityKind::KillerDiamond
        )
    }

    /// Kinds subject to gravity
    pub fn is_loose(&self) -> bool {
        matches!(
            self,
            EntityKind::Rock
                | EntityKind::Diamond
                | EntityKind::RockDiamond
                | EntityKind::Treasure
                | EntityKind::Trophy
                | EntityKind::GoldenKey
                | EntityKind::PrizeDiamond
                | EntityKind::KillerDiamond
        )
    }
}

/// Game actions that can be applied to a running session
///
/// These actions are used by both human input and remote control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Toggle pause state
    Pause,
    /// Give up the current life, or start over once the game has ended
    Restart,
}

impl GameAction {
    /// Parse action from string (for the remote control protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_boulder_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveUp"), Some(GameAction::MoveUp));
    /// assert_eq!(GameAction::from_str("pause"), Some(GameAction::Pause));
    /// assert_eq!(GameAction::from_str("hardDrop"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveup" => Some(GameAction::MoveUp),
            "movedown" => Some(GameAction::MoveDown),
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "pause" => Some(GameAction::Pause),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// Convert to camelCase string for the remote control protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveUp => "moveUp",
            GameAction::MoveDown => "moveDown",
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            GameAction::MoveUp => Some(Direction::Up),
            GameAction::MoveDown => Some(Direction::Down),
            GameAction::MoveLeft => Some(Direction::Left),
            GameAction::MoveRight => Some(Direction::Right),
            GameAction::Pause | GameAction::Restart => None,
        }
    }

    pub fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => GameAction::MoveUp,
            Direction::Down => GameAction::MoveDown,
            Direction::Left => GameAction::MoveLeft,
            Direction::Right => GameAction::MoveRight,
        }
    }
}
