//! Entity module - flat capability model of mine objects
//!
//! Every object is one [`Entity`] struct: identity, position, kind, a handful
//! of capability flags, and a small amount of per-kind data. Behavior is not
//! inherited; the world dispatches on [`Behavior`] (derived from the kind) and
//! on the flags.
//!
//! Flags:
//!
//! - `passable`: a mover may enter the cell, destroying the entity
//! - `pushable`: a mover may shove the entity one cell sideways
//! - `is_falling`: the entity moved down during its current fall
//! - `locked`: the entity is being torn down and ignores everything

use crate::types::{Cell, Direction, EntityKind};

/// Arena index of an entity inside its world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Behavior family an entity kind belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Walls, earth, barriers: no loop of their own
    Static,
    /// Gravity-driven objects
    Falling,
    Player,
    Enemy,
}

impl Behavior {
    pub fn of(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Behavior::Player,
            EntityKind::Zombie => Behavior::Enemy,
            k if k.is_loose() => Behavior::Falling,
            _ => Behavior::Static,
        }
    }
}

/// Visible sub-state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityState {
    #[default]
    Idle,
    /// Rock-diamond mid-transformation
    Changing,
    /// Rock-diamond after transformation
    Transformed,
    /// Treasure or trophy waiting for its unlock condition
    Sealed,
    /// Treasure or trophy ready to collect
    Open,
    /// Player caught by a zombie
    Frozen,
    /// Player crushed, about to die
    Splashed,
    Walking(Direction),
    Attacking,
    Dying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub cell: Cell,
    pub state: EntityState,
    pub passable: bool,
    pub pushable: bool,
    pub is_falling: bool,
    pub locked: bool,
    /// Barrier group name, if any
    pub group: Option<String>,
    /// Moved at least one cell down since the last landing
    pub(crate) fell: bool,
    /// Trophy: prize-unlocker diamonds still in play
    pub(crate) pending_prizes: i32,
    /// Zombie: last known player position
    pub(crate) target: Option<Cell>,
}

impl Entity {
    /// Create an entity with the default capabilities of its kind
    pub fn new(id: EntityId, kind: EntityKind, cell: Cell) -> Self {
        let (passable, pushable) = match kind {
            EntityKind::Diamond
            | EntityKind::GoldenKey
            | EntityKind::PrizeDiamond
            | EntityKind::KillerDiamond
            | EntityKind::Earth => (true, false),
            EntityKind::Rock
            | EntityKind::RockDiamond
            | EntityKind::Treasure
            | EntityKind::Trophy => (false, true),
            EntityKind::Player | EntityKind::Wall | EntityKind::Barrier | EntityKind::Zombie => {
                (false, false)
            }
        };
        let state = match kind {
            EntityKind::Treasure | EntityKind::Trophy => EntityState::Sealed,
            _ => EntityState::Idle,
        };
        Self {
            id,
            kind,
            cell,
            state,
            passable,
            pushable,
            is_falling: false,
            locked: false,
            group: None,
            fell: false,
            pending_prizes: 0,
            target: None,
        }
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn behavior(&self) -> Behavior {
        Behavior::of(self.kind)
    }

    /// Subject to gravity
    pub fn falls(&self) -> bool {
        self.behavior() == Behavior::Falling
    }

    pub fn is_alive(&self) -> bool {
        !self.locked
    }

    /// Rock kind, whatever state a rock diamond is in
    pub fn is_rock_like(&self) -> bool {
        matches!(self.kind, EntityKind::Rock | EntityKind::RockDiamond)
    }

    /// Filler a falling object may remove to make room while rolling aside
    pub fn is_filler(&self) -> bool {
        self.kind == EntityKind::Barrier && !self.locked
    }

    /// Topic a removed barrier announces, shared by its whole group
    pub fn removal_topic(&self) -> String {
        match &self.group {
            Some(group) => format!("Game:{}:{}:Removed", self.kind.name(), group),
            None => format!("Game:{}:Removed", self.kind.name()),
        }
    }

    pub(crate) fn topic(&self, what: &str) -> String {
        format!("Game:{}:{}", self.kind.name(), what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(kind: EntityKind) -> Entity {
        Entity::new(EntityId(0), kind, Cell::new(0, 0))
    }

    #[test]
    fn test_default_capabilities() {
        let rock = make(EntityKind::Rock);
        assert!(rock.pushable && !rock.passable && rock.falls());

        let diamond = make(EntityKind::Diamond);
        assert!(diamond.passable && !diamond.pushable && diamond.falls());

        let earth = make(EntityKind::Earth);
        assert!(earth.passable && !earth.falls());

        let wall = make(EntityKind::Wall);
        assert!(!wall.passable && !wall.pushable && !wall.falls());

        let treasure = make(EntityKind::Treasure);
        assert_eq!(treasure.state, EntityState::Sealed);
        assert!(treasure.pushable && !treasure.passable);
    }

    #[test]
    fn test_behavior_families() {
        assert_eq!(Behavior::of(EntityKind::Player), Behavior::Player);
        assert_eq!(Behavior::of(EntityKind::Zombie), Behavior::Enemy);
        assert_eq!(Behavior::of(EntityKind::GoldenKey), Behavior::Falling);
        assert_eq!(Behavior::of(EntityKind::Barrier), Behavior::Static);
    }

    #[test]
    fn test_rock_kind_ignores_state() {
        let mut rd = make(EntityKind::RockDiamond);
        assert!(rd.is_rock_like());
        rd.state = EntityState::Transformed;
        assert!(rd.is_rock_like());
        assert!(make(EntityKind::Rock).is_rock_like());
        assert!(!make(EntityKind::Diamond).is_rock_like());
    }

    #[test]
    fn test_removal_topic_uses_group() {
        let plain = make(EntityKind::Barrier);
        assert_eq!(plain.removal_topic(), "Game:Barrier:Removed");

        let gated = make(EntityKind::Barrier).with_group(Some("gate".into()));
        assert_eq!(gated.removal_topic(), "Game:Barrier:gate:Removed");
        assert!(gated.is_filler());
    }
}
