//! Zombie behavior: decision loop, moves, attack pose and death sequence.
//!
//! A zombie never polls the player. It keeps the last position announced by
//! `Game:Started` / `Game:Player:Moved` and walks toward it, one horizontal
//! then one vertical step per decision.

use arrayvec::ArrayVec;
use log::debug;

use crate::entity::{EntityId, EntityState};
use crate::error::SimError;
use crate::events::Event;
use crate::scheduler::Flow;
use crate::types::*;
use crate::world::{Task, World};

impl World {
    pub(crate) fn enemy_step(&mut self, id: EntityId) -> Result<Flow, SimError> {
        let enemy = self.entity(id)?;
        if enemy.locked || enemy.state == EntityState::Dying {
            return Ok(Flow::Stop);
        }
        let Some(target) = enemy.target else {
            return Ok(Flow::Continue(ENEMY_STEP_MS));
        };
        let here = enemy.cell;
        let dr = target.row - here.row;
        let dc = target.col - here.col;

        let aligned = (dr == 0 && dc.abs() <= ENEMY_ATTACK_RANGE)
            || (dc == 0 && dr.abs() <= ENEMY_ATTACK_RANGE);
        if aligned && self.rng.chance(ENEMY_ATTACK_CHANCE) {
            self.enemy_attack(id)?;
            return Ok(Flow::Continue(ENEMY_STEP_MS));
        }

        let mut moves: ArrayVec<Direction, 2> = ArrayVec::new();
        if dc != 0 {
            moves.push(if dc < 0 { Direction::Left } else { Direction::Right });
        }
        if dr != 0 {
            moves.push(if dr < 0 { Direction::Up } else { Direction::Down });
        }
        for dir in moves {
            if self.entity(id)?.locked {
                break;
            }
            self.enemy_move(id, dir)?;
        }
        Ok(Flow::Continue(ENEMY_STEP_MS))
    }

    /// One zombie step, gated like any other mover
    ///
    /// Earth is dug through, pushable objects are shoved sideways, the player
    /// is frozen on contact; everything else blocks.
    pub(crate) fn enemy_move(&mut self, id: EntityId, dir: Direction) -> Result<bool, SimError> {
        let to = self.entity(id)?.cell.step(dir);
        if !self.grid.contains(to) {
            return Ok(false);
        }

        if let Some(other) = self.grid.at(to) {
            let other = self.entity(other)?;
            let oid = other.id;
            match other.kind {
                EntityKind::Player => {
                    self.freeze_player()?;
                    return Ok(false);
                }
                EntityKind::Earth => {
                    self.destroy(oid)?;
                }
                _ if other.pushable && dir.is_horizontal() => {
                    if !self.push(oid, dir)? {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            }
        }
        if self.grid.at(to).is_some() {
            return Ok(false);
        }

        self.relocate(id, to)?;
        self.entity_mut(id)?.state = EntityState::Walking(dir);
        let event = Event::new(self.entity(id)?.topic("Moved")).from_entity(id, to);
        self.raise(event);
        self.rearm_idle(id);
        Ok(true)
    }

    fn enemy_attack(&mut self, id: EntityId) -> Result<(), SimError> {
        let enemy = self.entity_mut(id)?;
        enemy.state = EntityState::Attacking;
        let event = Event::new(enemy.topic("Attacking")).from_entity(id, enemy.cell);
        self.raise(event);
        self.rearm_idle(id);
        Ok(())
    }

    fn rearm_idle(&mut self, id: EntityId) {
        self.scheduler.stop(&Task::EnemyIdle(id));
        self.schedule(ENEMY_IDLE_MS, Task::EnemyIdle(id));
    }

    pub(crate) fn enemy_idle(&mut self, id: EntityId) -> Result<(), SimError> {
        let enemy = self.entity_mut(id)?;
        if matches!(enemy.state, EntityState::Walking(_) | EntityState::Attacking) {
            enemy.state = EntityState::Idle;
        }
        Ok(())
    }

    /// Kill the first zombie still standing, if any
    pub(crate) fn kill_one_enemy(&mut self) -> Result<(), SimError> {
        let victim = self
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Zombie && !e.locked && e.state != EntityState::Dying)
            .map(|e| e.id);
        match victim {
            Some(id) => self.kill_enemy(id),
            None => Ok(()),
        }
    }

    fn kill_enemy(&mut self, id: EntityId) -> Result<(), SimError> {
        self.scheduler.stop_where(|t| t.owner() == Some(id));
        let enemy = self.entity_mut(id)?;
        enemy.state = EntityState::Dying;
        let event = Event::new(enemy.topic("Dying")).from_entity(id, enemy.cell);
        debug!("zombie {:?} dying", id);
        self.raise(event);
        self.schedule(DYING_MS, Task::EnemyGone(id));
        Ok(())
    }

    pub(crate) fn enemy_gone(&mut self, id: EntityId) -> Result<(), SimError> {
        let cell = self.entity(id)?.cell;
        self.lock(id);
        if self.grid.at(cell) == Some(id) {
            self.grid.drop(cell);
        }
        self.wake_above(cell);
        Ok(())
    }
}
