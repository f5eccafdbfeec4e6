//! Scheduler module - discrete, delay-ordered task queue
//!
//! The scheduler is a simulation clock, not a timer wheel on wall time. The
//! owner advances the clock explicitly and pops every due task in order:
//! earlier fire time first, ties broken by schedule order (FIFO).
//!
//! Tasks are plain values (`T`), compared by equality for cancellation. A
//! periodic behavior is a task whose handler schedules the same task again;
//! loop bodies report that decision with [`Flow`]. Stopping a loop means
//! nobody re-arms it.

use std::collections::BTreeMap;

/// Handle of one scheduled task instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run again after the given delay (ms)
    Continue(u32),
    Stop,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TaskId), T>,
}

impl<T: PartialEq> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current clock value (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `task` to fire `delay_ms` from now
    pub fn run_after(&mut self, delay_ms: u32, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.insert((self.now + u64::from(delay_ms), id), task);
        id
    }

    /// Schedule `task` unless an equal task is already pending
    pub fn ensure_after(&mut self, delay_ms: u32, task: T) -> Option<TaskId> {
        if self.is_scheduled(&task) {
            return None;
        }
        Some(self.run_after(delay_ms, task))
    }

    /// Cancel one task instance
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let key = self.queue.keys().find(|(_, k)| *k == id).copied()?;
        self.queue.remove(&key)
    }

    /// Cancel every pending task equal to `task`; returns how many
    pub fn stop(&mut self, task: &T) -> usize {
        self.stop_where(|t| t == task)
    }

    /// Cancel every pending task matching `pred`; returns how many
    pub fn stop_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, t| !pred(t));
        before - self.queue.len()
    }

    /// Cancel everything
    pub fn stop_all(&mut self) -> usize {
        let n = self.queue.len();
        self.queue.clear();
        n
    }

    pub fn is_scheduled(&self, task: &T) -> bool {
        self.queue.values().any(|t| t == task)
    }

    /// Delay left before the earliest pending instance of `task`
    pub fn remaining(&self, task: &T) -> Option<u32> {
        self.queue
            .iter()
            .find(|(_, t)| *t == task)
            .map(|((at, _), _)| Self::delay_between(self.now, *at))
    }

    /// Pop the next task due at or before `until`, moving the clock to its
    /// fire time
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let (&(at, id), _) = self.queue.iter().next()?;
        if at > until {
            return None;
        }
        let task = self.queue.remove(&(at, id))?;
        self.now = self.now.max(at);
        Some(task)
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Remove every pending task, returning each with its remaining delay,
    /// in fire order
    pub fn drain(&mut self) -> Vec<(u32, T)> {
        let now = self.now;
        std::mem::take(&mut self.queue)
            .into_iter()
            .map(|((at, _), task)| (Self::delay_between(now, at), task))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn delay_between(now: u64, at: u64) -> u32 {
        u32::try_from(at.saturating_sub(now)).unwrap_or(u32::MAX)
    }
}

impl<T: PartialEq> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_until(s: &mut Scheduler<&'static str>, until: u64) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due(until)).collect()
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut s = Scheduler::new();
        s.run_after(300, "c");
        s.run_after(100, "a");
        s.run_after(200, "b");
        assert_eq!(fire_until(&mut s, 1000), vec!["a", "b", "c"]);
        assert_eq!(s.now(), 300);
    }

    #[test]
    fn test_ties_break_fifo() {
        let mut s = Scheduler::new();
        s.run_after(100, "first");
        s.run_after(100, "second");
        s.run_after(100, "third");
        assert_eq!(fire_until(&mut s, 100), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_not_due_stays_pending() {
        let mut s = Scheduler::new();
        s.run_after(150, "fall");
        assert!(fire_until(&mut s, 149).is_empty());
        s.advance_to(149);
        assert_eq!(s.remaining(&"fall"), Some(1));
        assert_eq!(fire_until(&mut s, 150), vec!["fall"]);
    }

    #[test]
    fn test_delays_are_relative_to_clock() {
        let mut s = Scheduler::new();
        s.advance_to(1000);
        s.run_after(50, "x");
        assert!(s.pop_due(1049).is_none());
        assert_eq!(s.pop_due(1050), Some("x"));
    }

    #[test]
    fn test_stop_cancels_every_equal_task() {
        let mut s = Scheduler::new();
        s.run_after(10, "loop");
        s.run_after(20, "other");
        s.run_after(30, "loop");
        assert_eq!(s.stop(&"loop"), 2);
        assert!(!s.is_scheduled(&"loop"));
        assert_eq!(fire_until(&mut s, 100), vec!["other"]);
    }

    #[test]
    fn test_cancel_one_instance() {
        let mut s = Scheduler::new();
        let first = s.run_after(10, "loop");
        s.run_after(20, "loop");
        assert_eq!(s.cancel(first), Some("loop"));
        assert_eq!(s.cancel(first), None);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_ensure_after_keeps_single_instance() {
        let mut s = Scheduler::new();
        assert!(s.ensure_after(150, "fall").is_some());
        assert!(s.ensure_after(150, "fall").is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_stop_all_and_drain() {
        let mut s = Scheduler::new();
        s.run_after(10, "a");
        s.run_after(20, "b");
        s.advance_to(5);
        assert_eq!(s.drain(), vec![(5, "a"), (15, "b")]);
        assert!(s.is_empty());

        s.run_after(10, "c");
        assert_eq!(s.stop_all(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn test_self_rearming_loop() {
        let mut s = Scheduler::new();
        s.run_after(100, "tick");
        let mut fired = 0;
        while let Some(task) = s.pop_due(450) {
            fired += 1;
            let flow = if fired < 3 { Flow::Continue(100) } else { Flow::Stop };
            if let Flow::Continue(delay) = flow {
                s.run_after(delay, task);
            }
        }
        assert_eq!(fired, 3);
        assert!(s.is_empty());
    }
}
