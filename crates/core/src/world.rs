//! World module - one running level of the mine
//!
//! The world owns everything a level needs: the grid, the entity arena, the
//! event bus, the scheduler and the level counters (score, diamonds left,
//! countdown). All of it is single-threaded and advanced by the owner with
//! [`World::advance`]; there is no wall clock inside.
//!
//! Causal effects between entities go through the event bus. Subscribers are
//! [`Handler`] values: the world interprets them in [`World::handle`], which
//! keeps the bus free of closures and lets group teardown drop every gameplay
//! subscription by topic prefix.
//!
//! Timed behavior goes through the scheduler as [`Task`] values. Loops
//! (falling, zombie decisions, countdown) re-arm themselves after each
//! iteration; one-shot transitions (unlock, transform, death sequences) fire
//! once.

use log::{debug, error, info, warn};

use crate::entity::{Behavior, Entity, EntityId, EntityState};
use crate::error::{LevelError, SimError};
use crate::events::{Event, EventBus};
use crate::grid::Grid;
use crate::level::LevelPlan;
use crate::rng::SimpleRng;
use crate::scheduler::{Flow, Scheduler};
use crate::snapshot::{GameSnapshot, Tile};
use crate::types::*;

/// Scheduled work items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// One fall step of a loose object
    Fall(EntityId),
    /// Wake every loose object
    FallSweep,
    Countdown,
    EnemyStep(EntityId),
    /// Zombie back to its idle pose
    EnemyIdle(EntityId),
    /// Rock-diamond change sequence end
    Transform(EntityId),
    /// Treasure or trophy opening
    Unlock(EntityId),
    /// Splashed sequence end
    PlayerGone(EntityId),
    /// Dying sequence end
    EnemyGone(EntityId),
    /// End-of-level delay elapsed
    Conclude,
}

impl Task {
    pub fn owner(&self) -> Option<EntityId> {
        match *self {
            Task::Fall(id)
            | Task::EnemyStep(id)
            | Task::EnemyIdle(id)
            | Task::Transform(id)
            | Task::Unlock(id)
            | Task::PlayerGone(id)
            | Task::EnemyGone(id) => Some(id),
            Task::FallSweep | Task::Countdown | Task::Conclude => None,
        }
    }
}

/// Level-wide reactions to gameplay events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Award points and count one goal diamond down
    Collect(u32),
    /// Like `Collect`, then kill one zombie unless the level is won
    CollectKiller(u32),
    Points(u32),
    DisableInput,
    Defeat,
}

/// Event subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Level(Reaction),
    /// Treasure waiting for the golden key
    OpenTreasure(EntityId),
    /// Trophy counting prize-unlocker diamonds
    TallyPrizes { trophy: EntityId, delta: i32 },
    /// Zombie following player positions
    TrackPlayer(EntityId),
    /// Barrier removed together with its group
    Cascade(EntityId),
}

impl Handler {
    pub fn owner(&self) -> Option<EntityId> {
        match *self {
            Handler::Level(_) => None,
            Handler::OpenTreasure(id)
            | Handler::TallyPrizes { trophy: id, .. }
            | Handler::TrackPlayer(id)
            | Handler::Cascade(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelStatus {
    /// Built, not started
    Ready,
    Running,
    Won,
    Lost,
}

const LEVEL_REACTIONS: [(&str, Reaction); 14] = [
    ("Game:Diamond:Collected", Reaction::Collect(SCORE_DIAMOND)),
    ("Game:RockDiamond:Collected", Reaction::Collect(SCORE_DIAMOND)),
    ("Game:PUDiamond:Collected", Reaction::Collect(SCORE_SPECIAL_DIAMOND)),
    ("Game:ZDiamond:Collected", Reaction::CollectKiller(SCORE_SPECIAL_DIAMOND)),
    ("Game:GoldenKey:Collected", Reaction::Points(SCORE_GOLDEN_KEY)),
    ("Game:Treasure:Collected", Reaction::Points(SCORE_TREASURE)),
    ("Game:Trophy:Collected", Reaction::Points(SCORE_TROPHY)),
    ("Game:Trophy:Opened", Reaction::Points(SCORE_TROPHY_OPENED)),
    ("Game:Earth:Digged", Reaction::Points(SCORE_EARTH)),
    ("Game:RockDiamond:Changed", Reaction::Points(SCORE_ROCK_CHANGED)),
    ("Game:Zombie:Dying", Reaction::Points(SCORE_ZOMBIE_KILLED)),
    ("Game:Player:Frozen", Reaction::DisableInput),
    ("Game:Player:Splashed", Reaction::DisableInput),
    ("Game:Player:Dead", Reaction::Defeat),
];

#[derive(Debug, Clone)]
pub struct World {
    name: String,
    pub(crate) grid: Grid<EntityId>,
    pub(crate) entities: Vec<Entity>,
    pub(crate) bus: EventBus<Handler>,
    pub(crate) scheduler: Scheduler<Task>,
    pub(crate) rng: SimpleRng,
    pub(crate) player: Option<EntityId>,
    pub(crate) status: LevelStatus,
    pub(crate) input_enabled: bool,
    score: u32,
    remaining: u32,
    goal: u32,
    countdown: u32,
    paused: bool,
    /// Tasks drained by `pause`, with their remaining delay
    suspended: Vec<(u32, Task)>,
    concluded: bool,
    dispatching: bool,
    journal: Vec<Event>,
    faults: u32,
}

impl World {
    /// Build a level from its plan
    pub fn new(plan: &LevelPlan, seed: u32) -> Result<Self, LevelError> {
        let placements = plan.placements()?;
        let (rows, cols) = plan.dimensions();

        let mut world = Self {
            name: plan.name.clone(),
            grid: Grid::new(rows, cols),
            entities: Vec::with_capacity(placements.len()),
            bus: EventBus::new(),
            scheduler: Scheduler::new(),
            rng: SimpleRng::new(seed),
            player: None,
            status: LevelStatus::Ready,
            input_enabled: true,
            score: 0,
            remaining: 0,
            goal: 0,
            countdown: plan.countdown_secs(),
            paused: false,
            suspended: Vec::new(),
            concluded: false,
            dispatching: false,
            journal: Vec::new(),
            faults: 0,
        };

        world
            .bus
            .connect_many(LEVEL_REACTIONS.iter().map(|(t, r)| (*t, Handler::Level(*r))));

        for p in placements {
            world.spawn(p.kind, p.cell, p.group);
        }
        world.goal = world
            .entities
            .iter()
            .filter(|e| e.kind.counts_toward_goal())
            .count() as u32;
        world.remaining = world.goal;

        Ok(world)
    }

    fn spawn(&mut self, kind: EntityKind, cell: Cell, group: Option<String>) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        let entity = Entity::new(id, kind, cell).with_group(group);

        match kind {
            EntityKind::Player => self.player = Some(id),
            EntityKind::Treasure => {
                self.bus
                    .connect("Game:GoldenKey:Collected", Handler::OpenTreasure(id));
            }
            EntityKind::Trophy => {
                self.bus.connect(
                    "Game:PUDiamond:Started",
                    Handler::TallyPrizes { trophy: id, delta: 1 },
                );
                self.bus.connect(
                    "Game:PUDiamond:Collected",
                    Handler::TallyPrizes { trophy: id, delta: -1 },
                );
            }
            EntityKind::Zombie => {
                self.bus.connect("Game:Started", Handler::TrackPlayer(id));
                self.bus.connect("Game:Player:Moved", Handler::TrackPlayer(id));
            }
            EntityKind::Barrier => {
                self.bus.connect(&entity.removal_topic(), Handler::Cascade(id));
            }
            _ => {}
        }

        self.grid.set(cell, id);
        self.entities.push(entity);
        id
    }

    /// Start the level loops
    pub fn start(&mut self) {
        if self.status != LevelStatus::Ready {
            return;
        }
        self.status = LevelStatus::Running;
        info!(
            "level {:?} started: {} diamonds, {}s on the clock",
            self.name, self.goal, self.countdown
        );

        let mut started = Event::new("Game:Started");
        if let Some(player) = self.player() {
            started = started.from_entity(player.id, player.cell);
        }
        self.raise(started);

        let prizes: Vec<(EntityId, Cell)> = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::PrizeDiamond)
            .map(|e| (e.id, e.cell))
            .collect();
        for (id, cell) in prizes {
            self.raise(Event::new("Game:PUDiamond:Started").from_entity(id, cell));
        }

        // A trophy with nothing to wait for opens right away
        let open_now: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Trophy && e.pending_prizes <= 0)
            .map(|e| e.id)
            .collect();
        for id in open_now {
            self.schedule(UNLOCK_DELAY_MS, Task::Unlock(id));
        }

        self.schedule(SWEEP_START_MS, Task::FallSweep);
        self.schedule(COUNTDOWN_START_MS, Task::Countdown);
        for id in self.enemy_ids() {
            self.schedule(ENEMY_START_MS, Task::EnemyStep(id));
        }
    }

    /// Advance the simulation clock, firing every task that falls due
    pub fn advance(&mut self, elapsed_ms: u32) {
        if self.paused || self.status == LevelStatus::Ready {
            return;
        }
        let until = self.scheduler.now() + u64::from(elapsed_ms);
        while let Some(task) = self.scheduler.pop_due(until) {
            if let Err(err) = self.fire(task) {
                self.fault(&format!("{task:?}"), err);
            }
        }
        self.scheduler.advance_to(until);
    }

    fn fire(&mut self, task: Task) -> Result<(), SimError> {
        match task {
            Task::Fall(id) => {
                if let Flow::Continue(delay) = self.fall_step(id)? {
                    self.schedule(delay, task);
                }
            }
            Task::FallSweep => {
                self.sweep();
                self.schedule(FALL_SWEEP_MS, task);
            }
            Task::Countdown => {
                if let Flow::Continue(delay) = self.countdown_step()? {
                    self.schedule(delay, task);
                }
            }
            Task::EnemyStep(id) => {
                if let Flow::Continue(delay) = self.enemy_step(id)? {
                    self.schedule(delay, task);
                }
            }
            Task::EnemyIdle(id) => self.enemy_idle(id)?,
            Task::Transform(id) => self.finish_transform(id)?,
            Task::Unlock(id) => self.unlock(id)?,
            Task::PlayerGone(id) => self.player_gone(id)?,
            Task::EnemyGone(id) => self.enemy_gone(id)?,
            Task::Conclude => self.concluded = true,
        }
        Ok(())
    }

    /// Schedule a task, refusing work for a finished level or a locked owner
    pub(crate) fn schedule(&mut self, delay_ms: u32, task: Task) -> bool {
        if self.status != LevelStatus::Running && task != Task::Conclude {
            debug!("{task:?} dropped: level is {:?}", self.status);
            return false;
        }
        if let Some(owner) = task.owner() {
            if self.entities.get(owner.index()).map_or(true, |e| e.locked) {
                warn!("{task:?} dropped: owner is gone");
                return false;
            }
        }
        self.scheduler.run_after(delay_ms, task);
        true
    }

    /// Raise an event and dispatch it synchronously
    ///
    /// When called from inside a handler the event is queued behind the one
    /// being dispatched.
    pub fn raise(&mut self, event: Event) {
        self.bus.raise(event);
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some((event, handlers)) = self.bus.next_dispatch() {
            self.journal.push(event.clone());
            for handler in handlers {
                if let Err(err) = self.handle(handler, &event) {
                    self.fault(&event.topic, err);
                }
            }
        }
        self.dispatching = false;
    }

    fn handle(&mut self, handler: Handler, event: &Event) -> Result<(), SimError> {
        match handler {
            Handler::Level(reaction) => self.react(reaction),
            Handler::OpenTreasure(id) => {
                if self.entity(id)?.state == EntityState::Sealed {
                    self.schedule(UNLOCK_DELAY_MS, Task::Unlock(id));
                }
                Ok(())
            }
            Handler::TallyPrizes { trophy, delta } => {
                let entity = self.entity_mut(trophy)?;
                if entity.locked {
                    return Ok(());
                }
                entity.pending_prizes += delta;
                let open = delta < 0
                    && entity.pending_prizes <= 0
                    && entity.state == EntityState::Sealed;
                if open && !self.scheduler.is_scheduled(&Task::Unlock(trophy)) {
                    self.schedule(UNLOCK_DELAY_MS, Task::Unlock(trophy));
                }
                Ok(())
            }
            Handler::TrackPlayer(id) => {
                if let Some(cell) = event.cell {
                    self.entity_mut(id)?.target = Some(cell);
                }
                Ok(())
            }
            Handler::Cascade(id) => self.destroy(id).map(|_| ()),
        }
    }

    fn react(&mut self, reaction: Reaction) -> Result<(), SimError> {
        match reaction {
            Reaction::Collect(points) => self.collect(points),
            Reaction::CollectKiller(points) => {
                self.collect(points);
                if self.status == LevelStatus::Running {
                    self.kill_one_enemy()?;
                }
            }
            Reaction::Points(points) => self.score += points,
            Reaction::DisableInput => self.input_enabled = false,
            Reaction::Defeat => self.lose(),
        }
        Ok(())
    }

    fn collect(&mut self, points: u32) {
        self.score += points;
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.win();
        }
    }

    fn win(&mut self) {
        if self.status != LevelStatus::Running {
            return;
        }
        self.status = LevelStatus::Won;
        info!("level {:?} won with {} points", self.name, self.score);
        self.teardown();
        self.schedule(LEVEL_WON_DELAY_MS, Task::Conclude);
    }

    fn lose(&mut self) {
        if self.status != LevelStatus::Running {
            return;
        }
        self.status = LevelStatus::Lost;
        info!("level {:?} lost", self.name);
        self.teardown();
        self.schedule(GAME_OVER_DELAY_MS, Task::Conclude);
    }

    fn teardown(&mut self) {
        let cancelled = self.scheduler.stop_all();
        self.suspended.clear();
        let topics = self.bus.disconnect_group("Game:");
        debug!("teardown: {cancelled} tasks cancelled, {topics} topics dropped");
    }

    pub(crate) fn fault(&mut self, context: &str, err: SimError) {
        self.faults += 1;
        error!("{context}: {err}");
    }

    fn countdown_step(&mut self) -> Result<Flow, SimError> {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.splash_player()?;
            return Ok(Flow::Stop);
        }
        if self.countdown <= COUNTDOWN_ALARM_SECS && self.countdown % 2 == 0 {
            self.raise(Event::new("Game:Countdown:Alarm").with_value(i64::from(self.countdown)));
        }
        Ok(Flow::Continue(COUNTDOWN_STEP_MS))
    }

    fn unlock(&mut self, id: EntityId) -> Result<(), SimError> {
        let entity = self.entity_mut(id)?;
        if entity.locked || entity.state != EntityState::Sealed {
            return Ok(());
        }
        entity.state = EntityState::Open;
        entity.passable = true;
        entity.pushable = false;
        let event = Event::new(entity.topic("Opened")).from_entity(id, entity.cell);
        self.raise(event);
        Ok(())
    }

    /// Suspend every pending task
    pub fn pause(&mut self) -> bool {
        if self.status != LevelStatus::Running || self.paused {
            return false;
        }
        self.paused = true;
        self.suspended = self.scheduler.drain();
        debug!("paused with {} tasks suspended", self.suspended.len());
        self.raise(Event::new("Main:Game:Paused"));
        true
    }

    /// Restore every suspended task with the delay it had left, then re-arm
    /// any loop entry point that was not pending
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        for (delay, task) in std::mem::take(&mut self.suspended) {
            self.schedule(delay, task);
        }

        let mut loops = vec![(FALL_SWEEP_MS, Task::FallSweep)];
        if self.countdown > 0 {
            loops.push((COUNTDOWN_STEP_MS, Task::Countdown));
        }
        for id in self.enemy_ids() {
            loops.push((ENEMY_STEP_MS, Task::EnemyStep(id)));
        }
        for (period, task) in loops {
            if !self.scheduler.is_scheduled(&task) {
                self.schedule(period, task);
            }
        }
        debug!("resumed with {} tasks pending", self.scheduler.len());
        self.raise(Event::new("Main:Game:Resumed"));
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Zombies still able to act
    fn enemy_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.behavior() == Behavior::Enemy && !e.locked)
            .filter(|e| e.state != EntityState::Dying)
            .map(|e| e.id)
            .collect()
    }

    pub(crate) fn entity(&self, id: EntityId) -> Result<&Entity, SimError> {
        self.entities
            .get(id.index())
            .ok_or(SimError::UnknownEntity(id))
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SimError> {
        self.entities
            .get_mut(id.index())
            .ok_or(SimError::UnknownEntity(id))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid<EntityId> {
        &self.grid
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    /// Entity occupying a cell
    pub fn entity_at(&self, cell: Cell) -> Option<&Entity> {
        self.grid.at(cell).and_then(|id| self.get(id))
    }

    /// Every entity ever created in this level, destroyed ones included
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player.and_then(|id| self.get(id))
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Goal diamonds still to collect
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Seconds left on the countdown
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// The end-of-level delay has elapsed
    pub fn concluded(&self) -> bool {
        self.concluded
    }

    /// Simulation clock in milliseconds
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn is_scheduled(&self, task: &Task) -> bool {
        self.scheduler.is_scheduled(task)
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.bus.is_connected(topic)
    }

    /// Handler faults logged so far
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// Events raised so far, in dispatch order
    pub fn events(&self) -> &[Event] {
        &self.journal
    }

    /// Drain the event journal
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.rows = self.grid.rows();
        out.cols = self.grid.cols();
        out.tiles.clear();
        out.tiles
            .resize((out.rows.max(0) * out.cols.max(0)) as usize, None);
        for (cell, id) in self.grid.iter() {
            if let Some(entity) = self.get(id) {
                let idx = (cell.row * out.cols + cell.col) as usize;
                if let Some(slot) = out.tiles.get_mut(idx) {
                    *slot = Some(Tile {
                        kind: entity.kind,
                        state: entity.state,
                    });
                }
            }
        }
        out.player = self.player().filter(|p| !p.locked).map(|p| p.cell);
        out.score = self.score;
        out.remaining = self.remaining;
        out.countdown = self.countdown;
        out.level_name.clone_from(&self.name);
        out.paused = self.paused;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}
