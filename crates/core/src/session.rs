//! Session module - a whole game across levels
//!
//! A [`Session`] owns the current [`World`] and everything that outlives it:
//! the level number, the banked score of finished levels, and the best score.
//! It turns abstract [`GameAction`]s into world calls and walks the level flow:
//!
//! ```text
//! Idle -> Playing -> LevelComplete -> Playing (next level) ... -> WonAll
//!            \-> LevelLost -> GameOver
//! ```
//!
//! Levels come from a [`LevelSource`] and best scores go to a [`ScoreStore`];
//! both are injected so the core never touches the filesystem.

use std::error::Error;

use log::{error, info};

use crate::events::Event;
use crate::level::LevelPlan;
use crate::snapshot::GameSnapshot;
use crate::types::GameAction;
use crate::world::{LevelStatus, World};

pub type SourceError = Box<dyn Error + Send + Sync>;

/// Where level plans come from, numbered from 1
pub trait LevelSource {
    /// `Ok(None)` when there is no such level
    fn load(&self, level: u32) -> Result<Option<LevelPlan>, SourceError>;
}

/// Best-score persistence
pub trait ScoreStore {
    fn best_score(&self) -> u32;
    /// Record a final or intermediate score; returns whether it is a new best
    fn submit(&mut self, score: u32) -> bool;
}

/// Levels held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLevels {
    plans: Vec<LevelPlan>,
}

impl MemoryLevels {
    pub fn new(plans: Vec<LevelPlan>) -> Self {
        Self { plans }
    }
}

impl LevelSource for MemoryLevels {
    fn load(&self, level: u32) -> Result<Option<LevelPlan>, SourceError> {
        let idx = (level as usize).checked_sub(1);
        Ok(idx.and_then(|i| self.plans.get(i)).cloned())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryScores {
    best: u32,
}

impl MemoryScores {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl ScoreStore for MemoryScores {
    fn best_score(&self) -> u32 {
        self.best
    }

    fn submit(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Playing,
    /// Level won, waiting out the end-of-level delay
    LevelComplete,
    /// Player dead, waiting out the game-over delay
    LevelLost,
    GameOver,
    /// Every level of the source won
    WonAll,
    /// A level could not be loaded
    Failed(String),
}

impl SessionStatus {
    /// No level will run again without a new game
    pub fn is_over(&self) -> bool {
        matches!(
            self,
            SessionStatus::GameOver | SessionStatus::WonAll | SessionStatus::Failed(_)
        )
    }
}

pub struct Session<L, S> {
    levels: L,
    scores: S,
    seed: u32,
    first_level: u32,
    level: u32,
    /// Score of the levels finished before the current one
    banked: u32,
    world: Option<World>,
    status: SessionStatus,
    journal: Vec<Event>,
}

impl<L: LevelSource, S: ScoreStore> Session<L, S> {
    pub fn new(levels: L, scores: S, seed: u32) -> Self {
        Self {
            levels,
            scores,
            seed,
            first_level: 1,
            level: 0,
            banked: 0,
            world: None,
            status: SessionStatus::Idle,
            journal: Vec::new(),
        }
    }

    /// Start a new game at `level`
    pub fn start(&mut self, level: u32) {
        self.first_level = level.max(1);
        self.banked = 0;
        self.level = self.first_level;
        match self.levels.load(self.first_level) {
            Ok(Some(plan)) => self.begin_level(self.first_level, &plan),
            Ok(None) => self.fail(format!("level {} not found", self.first_level)),
            Err(err) => self.fail(format!("level {}: {err}", self.first_level)),
        }
    }

    fn begin_level(&mut self, level: u32, plan: &LevelPlan) {
        self.level = level;
        let mut world = match World::new(plan, self.seed.wrapping_add(level)) {
            Ok(world) => world,
            Err(err) => return self.fail(format!("level {level}: {err}")),
        };

        info!("starting level {level} {:?}", plan.name);
        self.status = SessionStatus::Playing;
        self.journal.push(
            Event::new("Stats:Level:Started")
                .with_value(i64::from(level))
                .for_level(level),
        );
        world.start();
        self.world = Some(world);
        self.collect_events();
    }

    fn fail(&mut self, message: String) {
        error!("{message}");
        self.world = None;
        self.status = SessionStatus::Failed(message);
    }

    /// Apply one player action; returns whether it changed anything
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        let changed = match action {
            GameAction::Restart if self.status.is_over() || self.status == SessionStatus::Idle => {
                self.start(self.first_level);
                true
            }
            _ if self.status != SessionStatus::Playing => false,
            GameAction::Restart => self.world.as_mut().is_some_and(World::give_up),
            GameAction::Pause => self.world.as_mut().is_some_and(World::toggle_pause),
            _ => match (action.direction(), self.world.as_mut()) {
                (Some(dir), Some(world)) => world.step_player(dir),
                _ => false,
            },
        };
        self.collect_events();
        self.settle();
        changed
    }

    /// Advance the current level's clock
    pub fn advance(&mut self, elapsed_ms: u32) {
        if let Some(world) = self.world.as_mut() {
            world.advance(elapsed_ms);
        }
        self.collect_events();
        self.settle();
    }

    /// Follow the current world's outcome through the level flow
    fn settle(&mut self) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        let (outcome, concluded, level_score) = (world.status(), world.concluded(), world.score());

        match self.status {
            SessionStatus::Playing if outcome == LevelStatus::Won => {
                self.status = SessionStatus::LevelComplete;
                let score = self.score();
                self.scores.submit(score);
                self.journal.push(
                    Event::new("Stats:Level:Won")
                        .with_value(i64::from(score))
                        .for_level(self.level),
                );
            }
            SessionStatus::Playing if outcome == LevelStatus::Lost => {
                self.status = SessionStatus::LevelLost;
                self.journal.push(Event::new("Main:Game:Over"));
            }
            SessionStatus::LevelComplete if concluded => {
                let next = self.level + 1;
                match self.levels.load(next) {
                    Ok(Some(plan)) => {
                        self.banked += level_score;
                        self.begin_level(next, &plan);
                    }
                    Ok(None) => {
                        let score = self.score();
                        info!("all levels won with {score} points");
                        self.scores.submit(score);
                        self.status = SessionStatus::WonAll;
                        self.journal.push(
                            Event::new("Stats:Level:Won:All")
                                .with_value(i64::from(score))
                                .for_level(self.level),
                        );
                    }
                    Err(err) => self.fail(format!("level {next}: {err}")),
                }
            }
            SessionStatus::LevelLost if concluded => {
                let score = self.score();
                info!("game over with {score} points");
                self.scores.submit(score);
                self.status = SessionStatus::GameOver;
            }
            _ => {}
        }
    }

    fn collect_events(&mut self) {
        if let Some(world) = self.world.as_mut() {
            self.journal.extend(world.take_events());
        }
    }

    /// Banked score plus the current level's
    pub fn score(&self) -> u32 {
        self.banked + self.world.as_ref().map_or(0, World::score)
    }

    pub fn best_score(&self) -> u32 {
        self.scores.best_score().max(self.score())
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn scores(&self) -> &S {
        &self.scores
    }

    /// Drain session and world events in raise order
    pub fn take_events(&mut self) -> Vec<Event> {
        self.collect_events();
        std::mem::take(&mut self.journal)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        match self.world.as_ref() {
            Some(world) => world.snapshot_into(out),
            None => out.clear(),
        }
        out.score = self.score();
        out.best_score = self.best_score();
        out.level = self.level;
        out.status = self.status.clone();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn session(levels: &[&[&str]]) -> Session<MemoryLevels, MemoryScores> {
        let plans = levels
            .iter()
            .enumerate()
            .map(|(i, rows)| LevelPlan::new(&format!("level {}", i + 1), rows))
            .collect();
        Session::new(MemoryLevels::new(plans), MemoryScores::default(), 7)
    }

    fn topics(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.topic.as_str()).collect()
    }

    #[test]
    fn test_start_announces_level_before_game() {
        let mut s = session(&[&["P*"]]);
        s.start(1);
        assert_eq!(s.status(), &SessionStatus::Playing);
        assert_eq!(s.level(), 1);
        let events = s.take_events();
        assert_eq!(topics(&events), vec!["Stats:Level:Started", "Game:Started"]);
        assert_eq!(events[0].value, 1);
    }

    #[test]
    fn test_win_carries_score_into_next_level() {
        let mut s = session(&[&["P*"], &["P.*"]]);
        s.start(1);
        assert!(s.apply_action(GameAction::MoveRight));
        assert_eq!(s.status(), &SessionStatus::LevelComplete);
        assert_eq!(s.scores().best_score(), SCORE_DIAMOND);
        assert!(topics(&s.take_events()).contains(&"Stats:Level:Won"));

        s.advance(LEVEL_WON_DELAY_MS);
        assert_eq!(s.status(), &SessionStatus::Playing);
        assert_eq!(s.level(), 2);
        assert_eq!(s.score(), SCORE_DIAMOND);

        assert!(s.apply_action(GameAction::MoveRight));
        assert_eq!(s.score(), SCORE_DIAMOND + SCORE_EARTH);
    }

    #[test]
    fn test_won_events_name_the_level() {
        let mut s = session(&[&["P*"], &["P*"]]);
        s.start(1);
        s.apply_action(GameAction::MoveRight);
        s.advance(LEVEL_WON_DELAY_MS);
        s.apply_action(GameAction::MoveRight);
        s.advance(LEVEL_WON_DELAY_MS);

        let events = s.take_events();
        let won: Vec<_> = events
            .iter()
            .filter(|e| e.topic == "Stats:Level:Won")
            .map(|e| (e.level, e.value))
            .collect();
        let total = i64::from(SCORE_DIAMOND * 2);
        assert_eq!(
            won,
            vec![(Some(1), i64::from(SCORE_DIAMOND)), (Some(2), total)]
        );
        let all = events
            .iter()
            .find(|e| e.topic == "Stats:Level:Won:All")
            .unwrap();
        assert_eq!((all.level, all.value), (Some(2), total));
    }

    /// Counts how often each level is read
    struct CountingLevels {
        inner: MemoryLevels,
        loads: std::cell::RefCell<Vec<u32>>,
    }

    impl LevelSource for CountingLevels {
        fn load(&self, level: u32) -> Result<Option<LevelPlan>, SourceError> {
            self.loads.borrow_mut().push(level);
            self.inner.load(level)
        }
    }

    #[test]
    fn test_each_level_is_loaded_once() {
        let levels = CountingLevels {
            inner: MemoryLevels::new(vec![
                LevelPlan::new("one", &["P*"]),
                LevelPlan::new("two", &["P*"]),
            ]),
            loads: Default::default(),
        };
        let mut s = Session::new(levels, MemoryScores::default(), 7);
        s.start(1);
        s.apply_action(GameAction::MoveRight);
        s.advance(LEVEL_WON_DELAY_MS);
        assert_eq!(s.level(), 2);
        s.apply_action(GameAction::MoveRight);
        s.advance(LEVEL_WON_DELAY_MS);
        assert_eq!(s.status(), &SessionStatus::WonAll);

        assert_eq!(*s.levels.loads.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_last_level_wins_all() {
        let mut s = session(&[&["P*"]]);
        s.start(1);
        s.apply_action(GameAction::MoveRight);
        s.advance(LEVEL_WON_DELAY_MS);
        assert_eq!(s.status(), &SessionStatus::WonAll);
        assert_eq!(s.score(), SCORE_DIAMOND);
        assert!(topics(&s.take_events()).contains(&"Stats:Level:Won:All"));
        assert_eq!(s.snapshot().status, SessionStatus::WonAll);
    }

    #[test]
    fn test_restart_gives_up_then_starts_over() {
        let mut s = session(&[&["P.*"]]);
        s.start(1);
        s.apply_action(GameAction::MoveRight);
        assert!(s.apply_action(GameAction::Restart));
        assert_eq!(s.status(), &SessionStatus::Playing);

        s.advance(SPLASH_MS);
        assert_eq!(s.status(), &SessionStatus::LevelLost);
        s.advance(GAME_OVER_DELAY_MS);
        assert_eq!(s.status(), &SessionStatus::GameOver);
        assert_eq!(s.scores().best_score(), SCORE_EARTH);

        assert!(!s.apply_action(GameAction::MoveRight));
        assert!(s.apply_action(GameAction::Restart));
        assert_eq!(s.status(), &SessionStatus::Playing);
        assert_eq!(s.score(), 0);
        assert_eq!(s.best_score(), SCORE_EARTH);
    }

    #[test]
    fn test_pause_action_toggles() {
        let mut s = session(&[&["P.*"]]);
        s.start(1);
        assert!(s.apply_action(GameAction::Pause));
        assert!(s.snapshot().paused);
        assert!(!s.apply_action(GameAction::MoveRight));
        assert!(s.apply_action(GameAction::Pause));
        assert!(s.apply_action(GameAction::MoveRight));
    }

    #[test]
    fn test_missing_level_fails_cleanly() {
        let mut s = session(&[]);
        s.start(1);
        assert_eq!(
            s.status(),
            &SessionStatus::Failed("level 1 not found".to_string())
        );
        assert!(s.world().is_none());
        s.advance(1000);
        assert!(s.status().is_over());
    }

    #[test]
    fn test_bad_level_fails_with_diagnostic() {
        let mut s = session(&[&["*?"]]);
        s.start(1);
        match s.status() {
            SessionStatus::Failed(msg) => assert!(msg.contains("level 1")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_reports_session_fields() {
        let mut s = session(&[&["P*", "##"]]);
        s.start(1);
        let snap = s.snapshot();
        assert_eq!(snap.level, 1);
        assert_eq!(snap.status, SessionStatus::Playing);
        assert_eq!(snap.remaining, 1);
        assert!(snap.playable());
    }
}
