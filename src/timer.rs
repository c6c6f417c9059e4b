//! Periodic timers with cadence-preserving catch-up.
//!
//! Timers live in registration order, not deadline order: the reactor only
//! ever needs "everything due now" plus "nearest deadline inside a bounded
//! horizon", so there is no heap here.

use crate::notify::TimeNotify;

use std::ptr;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub(crate) type TimerId = u64;

/// One periodic deadline.
///
/// `next_deadline` only ever advances by whole periods. After a delay the
/// sweep re-ticks the watcher once per elapsed period instead of jumping to
/// `now + period`, so the cadence survives a slow tick.
pub(crate) struct TimeWatcher {
    id: TimerId,
    period: Duration,
    next_deadline: Instant,
    handler: Rc<dyn TimeNotify>,
}

impl TimeWatcher {
    fn new(id: TimerId, period: Duration, handler: Rc<dyn TimeNotify>) -> Self {
        Self {
            id,
            period,
            next_deadline: Instant::now() + period,
            handler,
        }
    }

    /// Due when the deadline is at or before `reference`.
    fn due(&self, reference: Instant) -> bool {
        self.next_deadline <= reference
    }

    fn owned_by(&self, notify: &dyn TimeNotify) -> bool {
        ptr::addr_eq(Rc::as_ptr(&self.handler), notify as *const dyn TimeNotify)
    }
}

/// Owns all timers, in registration order.
pub(crate) struct TimerQueue {
    timers: Vec<TimeWatcher>,
    next_id: TimerId,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn add(&mut self, period: Duration, handler: Rc<dyn TimeNotify>) {
        debug_assert!(!period.is_zero(), "timer period must be non-zero");

        let id = self.next_id;
        self.next_id += 1;

        self.timers.push(TimeWatcher::new(id, period, handler));
    }

    /// Removes the first timer owned by `notify`, in registration order.
    /// No-op if the handler owns none; a second call for a single
    /// registration does nothing.
    pub(crate) fn remove_first(&mut self, notify: &dyn TimeNotify) {
        if let Some(pos) = self.timers.iter().position(|t| t.owned_by(notify)) {
            self.timers.remove(pos);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Snapshot of timer ids in registration order, so the sweep survives
    /// handlers that add or remove timers mid-sweep.
    pub(crate) fn ids(&self) -> Vec<TimerId> {
        self.timers.iter().map(|t| t.id).collect()
    }

    /// If the timer still exists and is due, advances its deadline by one
    /// period and hands back the handler to fire. The advance happens before
    /// the caller notifies, so a re-entrant look at the queue already sees
    /// the next deadline.
    pub(crate) fn advance_if_due(
        &mut self,
        id: TimerId,
        reference: Instant,
    ) -> Option<Rc<dyn TimeNotify>> {
        let t = self.timers.iter_mut().find(|t| t.id == id)?;
        if !t.due(reference) {
            return None;
        }

        t.next_deadline += t.period;
        Some(t.handler.clone())
    }

    /// Smallest remaining time-to-deadline among timers due within `horizon`
    /// of `reference`. Deadlines beyond the horizon never shorten the wait.
    pub(crate) fn next_within(&self, reference: Instant, horizon: Duration) -> Option<Duration> {
        self.timers
            .iter()
            .map(|t| t.next_deadline.saturating_duration_since(reference))
            .filter(|remaining| *remaining < horizon)
            .min()
    }
}
