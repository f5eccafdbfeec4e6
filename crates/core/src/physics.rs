//! Collision resolution: falling, rolling aside, pushing, player moves and
//! destruction.
//!
//! Only the code in this module (and the zombie moves in `enemy`) mutates the
//! grid, always while handling a single entity's move attempt.

use log::debug;

use crate::entity::{EntityId, EntityState};
use crate::error::SimError;
use crate::events::Event;
use crate::scheduler::Flow;
use crate::types::*;
use crate::world::{LevelStatus, Task, World};

impl World {
    /// Ask a loose object to start falling
    ///
    /// The first fall step runs after [`FALL_START_DELAY_MS`]. A request for an
    /// object whose fall is already scheduled is ignored, so an object never
    /// runs two fall loops at once.
    pub fn fall_down(&mut self, id: EntityId) -> bool {
        if self.status != LevelStatus::Running {
            return false;
        }
        match self.get(id) {
            Some(e) if e.falls() && !e.locked => {}
            _ => return false,
        }
        self.scheduler
            .ensure_after(FALL_START_DELAY_MS, Task::Fall(id))
            .is_some()
    }

    /// Wake the loose object resting on `cell`, if any
    pub(crate) fn wake_above(&mut self, cell: Cell) {
        if let Some(id) = self.grid.at(cell.above()) {
            self.fall_down(id);
        }
    }

    /// One iteration of the fall loop
    pub fn fall_step(&mut self, id: EntityId) -> Result<Flow, SimError> {
        let entity = self.entity(id)?;
        if entity.locked || !entity.falls() {
            return Ok(Flow::Stop);
        }
        let cell = entity.cell;
        let falling = entity.is_falling;
        if self.grid.at(cell) != Some(id) {
            return Err(SimError::Misplaced { id, cell });
        }

        // Whatever rests on this object follows it down
        self.wake_above(cell);

        let below = cell.below();
        if !self.grid.contains(below) {
            return self.land(id);
        }
        let Some(other) = self.grid.at(below) else {
            self.relocate(id, below)?;
            let entity = self.entity_mut(id)?;
            entity.is_falling = true;
            entity.fell = true;
            return Ok(Flow::Continue(FALL_STEP_MS));
        };

        let other = self.entity(other)?;
        if other.kind == EntityKind::Player {
            if falling {
                let entity = self.entity_mut(id)?;
                entity.is_falling = false;
                entity.fell = false;
                debug!("{:?} crushed the player at {:?}", id, below);
                self.splash_player()?;
                return Ok(Flow::Stop);
            }
            return self.land(id);
        }

        if other.falls() && !other.locked {
            if other.is_falling {
                // Still moving out of the way
                return Ok(Flow::Continue(FALL_STEP_MS));
            }
            if self.roll_aside(id)? {
                return Ok(Flow::Continue(FALL_STEP_MS));
            }
        }

        self.land(id)
    }

    fn land(&mut self, id: EntityId) -> Result<Flow, SimError> {
        let entity = self.entity_mut(id)?;
        let fell = entity.fell;
        entity.is_falling = false;
        entity.fell = false;
        if fell {
            self.touched_down(id)?;
        }
        Ok(Flow::Stop)
    }

    /// Cell is inside the grid and either empty or holding a removable filler
    fn is_clearable(&self, cell: Cell) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        match self.grid.at(cell) {
            None => true,
            Some(id) => self.get(id).is_some_and(|e| e.is_filler()),
        }
    }

    fn clear_filler(&mut self, cell: Cell) -> Result<(), SimError> {
        if let Some(id) = self.grid.at(cell) {
            self.destroy(id)?;
        }
        Ok(())
    }

    /// Slide one cell sideways off a resting object, left first
    fn roll_aside(&mut self, id: EntityId) -> Result<bool, SimError> {
        let cell = self.entity(id)?.cell;
        for dir in [Direction::Left, Direction::Right] {
            let side = cell.step(dir);
            let diagonal = side.below();
            if !(self.is_clearable(side) && self.is_clearable(diagonal)) {
                continue;
            }
            self.clear_filler(side)?;
            self.clear_filler(diagonal)?;
            if self.grid.at(side).is_some() {
                return Ok(false);
            }
            self.relocate(id, side)?;
            debug!("{:?} rolled {} to {:?}", id, dir.as_str(), side);
            return Ok(true);
        }
        Ok(false)
    }

    fn touched_down(&mut self, id: EntityId) -> Result<(), SimError> {
        let entity = self.entity(id)?;
        let cell = entity.cell;
        let changes = entity.kind == EntityKind::RockDiamond
            && entity.state == EntityState::Idle
            && self
                .grid
                .at(cell.below())
                .and_then(|below| self.get(below))
                .is_some_and(|below| below.is_rock_like());

        if !changes {
            let event = Event::new(entity.topic("TouchedDown")).from_entity(id, cell);
            self.raise(event);
            return Ok(());
        }

        let entity = self.entity_mut(id)?;
        entity.state = EntityState::Changing;
        let event = Event::new(entity.topic("Changing")).from_entity(id, cell);
        self.raise(event);
        self.schedule(TRANSFORM_MS, Task::Transform(id));
        Ok(())
    }

    pub(crate) fn finish_transform(&mut self, id: EntityId) -> Result<(), SimError> {
        let entity = self.entity_mut(id)?;
        if entity.locked || entity.state != EntityState::Changing {
            return Ok(());
        }
        entity.state = EntityState::Transformed;
        entity.passable = true;
        entity.pushable = false;
        let event = Event::new(entity.topic("Changed")).from_entity(id, entity.cell);
        debug!("{:?} turned into a diamond", id);
        self.raise(event);
        Ok(())
    }

    /// Move an entity's grid entry and position together
    pub(crate) fn relocate(&mut self, id: EntityId, to: Cell) -> Result<(), SimError> {
        let from = self.entity(id)?.cell;
        self.grid.try_move(from, to)?;
        self.entity_mut(id)?.cell = to;
        self.wake_above(from);
        Ok(())
    }

    /// Shove a pushable entity one cell sideways
    ///
    /// Vertical pushes are always denied. The destination must be empty.
    pub(crate) fn push(&mut self, id: EntityId, dir: Direction) -> Result<bool, SimError> {
        if !dir.is_horizontal() {
            return Ok(false);
        }
        let entity = self.entity(id)?;
        if entity.locked || !entity.pushable {
            return Ok(false);
        }
        let dest = entity.cell.step(dir);
        if !self.grid.contains(dest) || self.grid.at(dest).is_some() {
            return Ok(false);
        }

        self.relocate(id, dest)?;
        let event = Event::new(self.entity(id)?.topic("Pushed")).from_entity(id, dest);
        self.raise(event);
        self.fall_down(id);
        Ok(true)
    }

    /// Remove an entity from play, announcing it
    ///
    /// Earth announces `Digged`, barriers their group removal topic, everything
    /// else `Collected`. Destroying an already locked entity is a no-op and
    /// returns `false`, so two causes racing to destroy the same entity
    /// produce one announcement.
    pub fn destroy(&mut self, id: EntityId) -> Result<bool, SimError> {
        let entity = self.entity(id)?;
        if entity.locked {
            return Ok(false);
        }
        let cell = entity.cell;
        let topic = match entity.kind {
            EntityKind::Earth => entity.topic("Digged"),
            EntityKind::Barrier => entity.removal_topic(),
            _ => entity.topic("Collected"),
        };
        debug!("destroying {} {:?} at {:?}", entity.kind.name(), id, cell);

        self.lock(id);
        if self.grid.at(cell) == Some(id) {
            self.grid.drop(cell);
        }
        self.raise(Event::new(topic).from_entity(id, cell));
        self.wake_above(cell);
        Ok(true)
    }

    /// Mark an entity terminal: cancel its tasks and subscriptions
    pub(crate) fn lock(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(id.index()) {
            entity.locked = true;
            entity.is_falling = false;
        }
        self.scheduler.stop_where(|t| t.owner() == Some(id));
        self.bus.disconnect_where(|h| h.owner() == Some(id));
    }

    /// Apply a directional move command to the player
    ///
    /// Returns whether the player moved.
    pub fn step_player(&mut self, dir: Direction) -> bool {
        match self.try_step_player(dir) {
            Ok(moved) => moved,
            Err(err) => {
                self.fault("player move", err);
                false
            }
        }
    }

    fn try_step_player(&mut self, dir: Direction) -> Result<bool, SimError> {
        if self.status != LevelStatus::Running || self.paused() || !self.input_enabled {
            return Ok(false);
        }
        let Some(pid) = self.player else {
            return Ok(false);
        };
        let player = self.entity(pid)?;
        if player.locked || player.state != EntityState::Idle {
            return Ok(false);
        }
        let to = player.cell.step(dir);
        if !self.grid.contains(to) {
            return Ok(false);
        }

        if let Some(other) = self.grid.at(to) {
            let other = self.entity(other)?;
            let oid = other.id;
            if other.kind == EntityKind::Zombie {
                if other.state != EntityState::Dying {
                    self.freeze_player()?;
                }
                return Ok(false);
            } else if other.passable {
                self.destroy(oid)?;
            } else if other.pushable {
                if !self.push(oid, dir)? {
                    return Ok(false);
                }
            } else {
                return Ok(false);
            }
        }
        if self.grid.at(to).is_some() {
            return Ok(false);
        }

        self.relocate(pid, to)?;
        self.raise(Event::new("Game:Player:Moved").from_entity(pid, to));
        self.wake_above(to);
        Ok(true)
    }

    /// Player caught by a zombie: input stops until the player dies
    pub(crate) fn freeze_player(&mut self) -> Result<(), SimError> {
        let Some(pid) = self.player else {
            return Ok(());
        };
        let player = self.entity_mut(pid)?;
        if player.locked || player.state != EntityState::Idle {
            return Ok(());
        }
        player.state = EntityState::Frozen;
        let cell = player.cell;
        self.raise(Event::new("Game:Player:Frozen").from_entity(pid, cell));
        Ok(())
    }

    /// Player crushed, out of time, or giving up
    pub(crate) fn splash_player(&mut self) -> Result<(), SimError> {
        let Some(pid) = self.player else {
            return Ok(());
        };
        let player = self.entity_mut(pid)?;
        if player.locked || player.state == EntityState::Splashed {
            return Ok(());
        }
        player.state = EntityState::Splashed;
        let cell = player.cell;
        self.raise(Event::new("Game:Player:Splashed").from_entity(pid, cell));
        self.schedule(SPLASH_MS, Task::PlayerGone(pid));
        Ok(())
    }

    /// Give up the current life
    pub fn give_up(&mut self) -> bool {
        if self.status != LevelStatus::Running || self.paused() {
            return false;
        }
        match self.splash_player() {
            Ok(()) => true,
            Err(err) => {
                self.fault("give up", err);
                false
            }
        }
    }

    pub(crate) fn player_gone(&mut self, id: EntityId) -> Result<(), SimError> {
        let cell = self.entity(id)?.cell;
        self.lock(id);
        if self.grid.at(cell) == Some(id) {
            self.grid.drop(cell);
        }
        self.raise(Event::new("Game:Player:Dead").from_entity(id, cell));
        Ok(())
    }

    /// Wake every loose object that is not already falling
    pub(crate) fn sweep(&mut self) {
        let loose: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.falls() && !e.locked)
            .map(|e| e.id)
            .collect();
        for id in loose {
            if !self.scheduler.is_scheduled(&Task::Fall(id)) {
                self.fall_down(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityId, EntityState};
    use crate::level::{LevelPlan, SymbolDef};
    use crate::scheduler::Flow;
    use crate::types::*;
    use crate::world::{LevelStatus, World};

    fn running(rows: &[&str]) -> World {
        let mut w = World::new(&LevelPlan::new("test", rows), 1).unwrap();
        w.start();
        w.take_events();
        w
    }

    fn id_at(w: &World, row: i32, col: i32) -> EntityId {
        w.grid().at(Cell::new(row, col)).unwrap()
    }

    fn count(w: &World, topic: &str) -> usize {
        w.events().iter().filter(|e| e.topic == topic).count()
    }

    #[test]
    fn test_rock_falls_n_cells_then_touches_down() {
        let mut w = running(&["Po", "  ", "  ", "  "]);
        let rock = id_at(&w, 0, 1);

        for n in 1..=3 {
            assert_eq!(w.fall_step(rock).unwrap(), Flow::Continue(FALL_STEP_MS));
            assert_eq!(w.get(rock).unwrap().cell, Cell::new(n, 1));
            assert_eq!(count(&w, "Game:Rock:TouchedDown"), 0);
        }
        assert_eq!(w.fall_step(rock).unwrap(), Flow::Stop);
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(3, 1));
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 1);
        assert!(!w.get(rock).unwrap().is_falling);
    }

    #[test]
    fn test_resting_rock_does_not_touch_down() {
        let mut w = running(&["Po", " #"]);
        let rock = id_at(&w, 0, 1);
        assert_eq!(w.fall_step(rock).unwrap(), Flow::Stop);
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 0);
    }

    #[test]
    fn test_scenario_rock_beside_player_lands_on_floor() {
        let mut w = running(&[" o ", "   ", "P  "]);
        let rock = id_at(&w, 0, 1);

        w.fall_step(rock).unwrap();
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(1, 1));
        assert!(w.events().is_empty());

        w.fall_step(rock).unwrap();
        w.fall_step(rock).unwrap();
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(2, 1));
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 1);
        assert_eq!(w.player().unwrap().state, EntityState::Idle);
    }

    #[test]
    fn test_scenario_rock_crushes_player() {
        let mut w = running(&[" o ", "   ", " P "]);
        let rock = id_at(&w, 0, 1);

        w.fall_step(rock).unwrap();
        assert_eq!(w.fall_step(rock).unwrap(), Flow::Stop);
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(1, 1));
        assert_eq!(w.player().unwrap().state, EntityState::Splashed);
        assert_eq!(count(&w, "Game:Player:Splashed"), 1);
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 0);
    }

    #[test]
    fn test_rock_resting_on_player_does_not_crush() {
        let mut w = running(&["o", "P"]);
        let rock = id_at(&w, 0, 0);
        assert_eq!(w.fall_step(rock).unwrap(), Flow::Stop);
        assert_eq!(w.player().unwrap().state, EntityState::Idle);
    }

    #[test]
    fn test_roll_aside_left_then_resume_falling() {
        let mut w = running(&["Po ", " o ", "###"]);
        let top = id_at(&w, 0, 1);

        // (0,0) holds the player, so the left side is blocked
        assert_eq!(w.fall_step(top).unwrap(), Flow::Continue(FALL_STEP_MS));
        assert_eq!(w.get(top).unwrap().cell, Cell::new(0, 2));

        assert_eq!(w.fall_step(top).unwrap(), Flow::Continue(FALL_STEP_MS));
        assert_eq!(w.get(top).unwrap().cell, Cell::new(1, 2));

        assert_eq!(w.fall_step(top).unwrap(), Flow::Stop);
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 1);
    }

    #[test]
    fn test_roll_prefers_left() {
        let mut w = running(&["P o  ", "  o  ", "#####"]);
        let top = id_at(&w, 0, 2);
        w.fall_step(top).unwrap();
        assert_eq!(w.get(top).unwrap().cell, Cell::new(0, 1));
    }

    #[test]
    fn test_roll_blocked_both_sides_stops_for_good() {
        let mut w = running(&["#o#", ".o.", "#P#"]);
        let top = id_at(&w, 0, 1);
        for _ in 0..10 {
            assert_eq!(w.fall_step(top).unwrap(), Flow::Stop);
            assert_eq!(w.get(top).unwrap().cell, Cell::new(0, 1));
        }
    }

    #[test]
    fn test_roll_removes_barrier_fillers() {
        let mut w = running(&["Po=", " o=", "###"]);
        let top = id_at(&w, 0, 1);
        assert_eq!(w.fall_step(top).unwrap(), Flow::Continue(FALL_STEP_MS));
        assert_eq!(w.get(top).unwrap().cell, Cell::new(0, 2));
        assert!(w.grid().at(Cell::new(1, 2)).is_none());
        assert!(count(&w, "Game:Barrier:Removed") >= 1);
    }

    #[test]
    fn test_barrier_group_cascade() {
        let plan = LevelPlan::new("t", &["Pa.a", "b..b"])
            .define('a', SymbolDef::grouped("barrier", "gate"))
            .define('b', SymbolDef::role("barrier"));
        let mut w = World::new(&plan, 1).unwrap();
        w.start();

        let first = id_at(&w, 0, 1);
        assert!(w.destroy(first).unwrap());
        assert!(w.grid().at(Cell::new(0, 3)).is_none());
        assert!(w.grid().at(Cell::new(1, 0)).is_some());
        assert!(w.grid().at(Cell::new(1, 3)).is_some());
        assert_eq!(count(&w, "Game:Barrier:gate:Removed"), 2);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut w = running(&["P*", " *"]);
        let diamond = id_at(&w, 0, 1);
        assert!(w.destroy(diamond).unwrap());
        assert!(!w.destroy(diamond).unwrap());
        assert_eq!(count(&w, "Game:Diamond:Collected"), 1);
        assert_eq!(w.remaining(), 1);
        assert_eq!(w.score(), SCORE_DIAMOND);
    }

    #[test]
    fn test_player_digs_earth() {
        let mut w = running(&["P."]);
        assert!(w.step_player(Direction::Right));
        assert_eq!(w.player().unwrap().cell, Cell::new(0, 1));
        assert_eq!(count(&w, "Game:Earth:Digged"), 1);
        assert_eq!(count(&w, "Game:Player:Moved"), 1);
        assert_eq!(w.score(), SCORE_EARTH);
    }

    #[test]
    fn test_player_blocked_by_wall_and_edge() {
        let mut w = running(&["P#"]);
        assert!(!w.step_player(Direction::Right));
        assert!(!w.step_player(Direction::Up));
        assert!(!w.step_player(Direction::Left));
        assert_eq!(w.player().unwrap().cell, Cell::new(0, 0));
    }

    #[test]
    fn test_player_pushes_rock_horizontally() {
        let mut w = running(&["Po ", "###"]);
        assert!(w.step_player(Direction::Right));
        assert_eq!(w.entity_at(Cell::new(0, 2)).unwrap().kind, EntityKind::Rock);
        assert_eq!(w.player().unwrap().cell, Cell::new(0, 1));
        assert_eq!(count(&w, "Game:Rock:Pushed"), 1);

        // Nothing beyond the edge
        assert!(!w.step_player(Direction::Right));
    }

    #[test]
    fn test_vertical_push_is_always_denied() {
        let mut w = running(&["P", "o", " "]);
        assert!(!w.step_player(Direction::Down));
        let mut w = running(&[" ", "o", "P"]);
        assert!(!w.step_player(Direction::Up));
        assert_eq!(w.entity_at(Cell::new(1, 0)).unwrap().kind, EntityKind::Rock);
    }

    #[test]
    fn test_push_into_occupied_cell_denied() {
        let mut w = running(&["Po*"]);
        assert!(!w.step_player(Direction::Right));
        assert_eq!(w.player().unwrap().cell, Cell::new(0, 0));
    }

    #[test]
    fn test_player_touching_zombie_freezes() {
        let mut w = running(&["PZ"]);
        assert!(!w.step_player(Direction::Right));
        assert_eq!(w.player().unwrap().state, EntityState::Frozen);
        assert!(!w.input_enabled());
        assert!(!w.step_player(Direction::Left));
    }

    #[test]
    fn test_moving_away_wakes_rock_above() {
        let mut w = running(&["o ", "P ", "  "]);
        let rock = id_at(&w, 0, 0);
        assert!(w.step_player(Direction::Right));
        assert!(w.is_scheduled(&crate::world::Task::Fall(rock)));
        w.advance(FALL_START_DELAY_MS);
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(1, 0));
    }

    #[test]
    fn test_digging_under_rock_then_stepping_down_gets_crushed() {
        let mut w = running(&["o.", "P.", " ."]);
        let rock = id_at(&w, 0, 0);
        assert!(w.step_player(Direction::Down));
        // Rock falls into the vacated cell, then onto the player
        w.advance(FALL_START_DELAY_MS + FALL_STEP_MS);
        assert_eq!(w.get(rock).unwrap().cell, Cell::new(1, 0));
        assert_eq!(w.player().unwrap().state, EntityState::Splashed);
    }

    #[test]
    fn test_rock_diamond_changes_on_rock() {
        let mut w = running(&["Pr", "# ", "#o"]);
        let rd = id_at(&w, 0, 1);
        w.fall_step(rd).unwrap();
        w.fall_step(rd).unwrap();
        assert_eq!(w.get(rd).unwrap().state, EntityState::Changing);
        assert_eq!(count(&w, "Game:RockDiamond:Changing"), 1);
        assert_eq!(count(&w, "Game:RockDiamond:TouchedDown"), 0);

        w.advance(TRANSFORM_MS);
        let e = w.get(rd).unwrap();
        assert_eq!(e.state, EntityState::Transformed);
        assert!(e.passable && !e.pushable);
        assert_eq!(w.score(), SCORE_ROCK_CHANGED);
    }

    #[test]
    fn test_rock_diamond_changes_on_transformed_rock_diamond() {
        let mut w = running(&["Pr", "# ", "#r", "##"]);
        let upper = id_at(&w, 0, 1);
        let lower = id_at(&w, 2, 1);
        w.entity_mut(lower).unwrap().state = EntityState::Transformed;

        w.fall_step(upper).unwrap();
        w.fall_step(upper).unwrap();
        assert_eq!(w.get(upper).unwrap().cell, Cell::new(1, 1));
        assert_eq!(w.get(upper).unwrap().state, EntityState::Changing);
        assert_eq!(count(&w, "Game:RockDiamond:Changing"), 1);
        assert_eq!(count(&w, "Game:RockDiamond:TouchedDown"), 0);
    }

    #[test]
    fn test_rock_diamond_on_ground_touches_down() {
        let mut w = running(&["Pr", "  ", " #"]);
        let rd = id_at(&w, 0, 1);
        w.fall_step(rd).unwrap();
        w.fall_step(rd).unwrap();
        assert_eq!(w.get(rd).unwrap().state, EntityState::Idle);
        assert_eq!(count(&w, "Game:RockDiamond:TouchedDown"), 1);
    }

    #[test]
    fn test_last_diamond_wins_exactly_once() {
        let mut w = running(&["P**"]);
        assert!(w.step_player(Direction::Right));
        assert_eq!(w.status(), LevelStatus::Running);
        assert_eq!(w.remaining(), 1);
        assert!(w.step_player(Direction::Right));
        assert_eq!(w.status(), LevelStatus::Won);
        assert_eq!(w.remaining(), 0);

        w.raise(crate::events::Event::new("Game:Diamond:Collected"));
        assert_eq!(w.remaining(), 0);
        assert_eq!(w.status(), LevelStatus::Won);
    }

    #[test]
    fn test_golden_key_opens_treasure() {
        let mut w = running(&["PKT", "###"]);
        let treasure = id_at(&w, 0, 2);
        assert!(w.step_player(Direction::Right));
        assert_eq!(w.score(), SCORE_GOLDEN_KEY);
        assert_eq!(w.get(treasure).unwrap().state, EntityState::Sealed);

        w.advance(UNLOCK_DELAY_MS);
        let t = w.get(treasure).unwrap();
        assert_eq!(t.state, EntityState::Open);
        assert!(t.passable);

        assert!(w.step_player(Direction::Right));
        assert_eq!(w.score(), SCORE_GOLDEN_KEY + SCORE_TREASURE);
    }

    #[test]
    fn test_trophy_opens_after_prize_diamonds() {
        let mut w = running(&["PuuW*", "#####"]);
        let trophy = id_at(&w, 0, 3);
        assert!(w.step_player(Direction::Right));
        w.advance(UNLOCK_DELAY_MS);
        assert_eq!(w.get(trophy).unwrap().state, EntityState::Sealed);

        assert!(w.step_player(Direction::Right));
        w.advance(UNLOCK_DELAY_MS);
        assert_eq!(w.get(trophy).unwrap().state, EntityState::Open);
        assert_eq!(w.score(), 2 * SCORE_SPECIAL_DIAMOND + SCORE_TROPHY_OPENED);
    }

    #[test]
    fn test_trophy_without_prizes_opens_at_start() {
        let mut w = running(&["PW*", "###"]);
        let trophy = id_at(&w, 0, 1);
        w.advance(UNLOCK_DELAY_MS);
        assert_eq!(w.get(trophy).unwrap().state, EntityState::Open);
    }

    #[test]
    fn test_give_up_splashes_then_dies() {
        let mut w = running(&["P*"]);
        assert!(w.give_up());
        assert!(!w.step_player(Direction::Right));
        w.advance(SPLASH_MS);
        assert_eq!(w.status(), LevelStatus::Lost);
        assert_eq!(count(&w, "Game:Player:Dead"), 1);
    }

    #[test]
    fn test_sweep_starts_falls() {
        let mut w = running(&["P ", " *", "  "]);
        let diamond = id_at(&w, 1, 1);
        w.advance(SWEEP_START_MS + FALL_START_DELAY_MS);
        assert_eq!(w.get(diamond).unwrap().cell, Cell::new(2, 1));
        w.advance(FALL_STEP_MS);
        assert_eq!(count(&w, "Game:Diamond:TouchedDown"), 1);
    }

    #[test]
    fn test_column_falls_together() {
        let mut w = running(&["Po", "#o", "# ", "# ", "##"]);
        w.advance(SWEEP_START_MS + 2_000);
        assert_eq!(w.entity_at(Cell::new(3, 1)).unwrap().kind, EntityKind::Rock);
        assert_eq!(w.entity_at(Cell::new(2, 1)).unwrap().kind, EntityKind::Rock);
        assert_eq!(count(&w, "Game:Rock:TouchedDown"), 2);
    }
}
