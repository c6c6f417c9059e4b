//! The tick loop and dispatch machinery.

use super::poller::Poller;
use super::registry::{WatchId, WatchRegistry};
use super::sets::{SetBuilder, Tier};
use crate::interest::Interest;
use crate::notify::{IoNotify, NotificationHook, TimeNotify};
use crate::timer::TimerQueue;

use std::cell::{Cell, RefCell};
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Wait ceiling for a blocking tick with nothing nearer to do.
const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Timers further out than this never shorten the wait.
const TIMER_HORIZON: Duration = Duration::from_secs(10);

/// Buffer of (watch, matched readiness) pairs filled while walking the
/// registry, drained strictly LIFO once the walk is complete. Keeping ids
/// instead of references means callbacks are free to add and remove watches
/// without invalidating anything already enumerated.
struct NotifyStack {
    entries: Vec<(WatchId, Interest)>,
}

impl NotifyStack {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn push(&mut self, id: WatchId, matched: Interest) {
        self.entries.push((id, matched));
    }

    fn pop(&mut self) -> Option<(WatchId, Interest)> {
        self.entries.pop()
    }
}

/// Cooperative, single-threaded I/O reactor.
///
/// One `process_one_event` call is one full tick: rebuild the interest
/// tables if registrations changed, wait on the poller with a timeout
/// bounded by the nearest timer deadline, dispatch ready watches, then
/// service due timers. Everything runs on the calling thread; "concurrency"
/// is logical reentrancy only: a callback being dispatched may itself call
/// back into the reactor, including driving a full nested tick.
///
/// All methods take `&self`: internal state lives behind `Cell`/`RefCell`,
/// and every internal borrow is released before any callback is invoked, so
/// re-entering from a callback is safe by construction.
///
/// # Example
/// ```ignore
/// let reactor = Rc::new(Reactor::new());
/// reactor.watch_fd(fd, Interest::READ, handler.clone());
/// reactor.add_timer(Duration::from_millis(100), ticker.clone());
/// reactor.run();
/// ```
pub struct Reactor {
    poller: RefCell<Box<dyn Poller>>,
    watches: RefCell<WatchRegistry>,
    sets: RefCell<SetBuilder>,
    timers: RefCell<TimerQueue>,
    hook: Option<Rc<dyn NotificationHook>>,
    level: Cell<u32>,
    terminated: Cell<bool>,
}

impl Reactor {
    /// Creates a reactor with the default `select(2)` poller and no
    /// notification hook. Use [`ReactorBuilder`](crate::ReactorBuilder) to
    /// customize either.
    pub fn new() -> Self {
        crate::ReactorBuilder::new().build()
    }

    pub(crate) fn from_parts(
        poller: Box<dyn Poller>,
        hook: Option<Rc<dyn NotificationHook>>,
    ) -> Self {
        Self {
            poller: RefCell::new(poller),
            watches: RefCell::new(WatchRegistry::new()),
            sets: RefCell::new(SetBuilder::new()),
            timers: RefCell::new(TimerQueue::new()),
            hook,
            level: Cell::new(0),
            terminated: Cell::new(false),
        }
    }

    /// Registers interest in `fd` on behalf of `notify`.
    ///
    /// Always appends a fresh watch: registering the same handler or
    /// descriptor again never merges, and each registration is independently
    /// removable. The handler must stay registered no longer than it lives.
    pub fn watch_fd(&self, fd: RawFd, interest: Interest, notify: Rc<dyn IoNotify>) {
        log::trace!("watch fd={fd} interest={interest:?}");
        self.watches.borrow_mut().add(fd, interest, notify);
    }

    /// Clears `mask` from every watch owned by `notify`; watches left with
    /// no interest are dropped. Unknown handlers are a no-op. Safe to call
    /// from inside `notify_io`, including for the handler being dispatched.
    pub fn remove(&self, notify: &dyn IoNotify, mask: Interest) {
        log::trace!("remove mask={mask:?}");
        self.watches.borrow_mut().remove(notify, mask);
    }

    /// Registers a periodic timer firing every `period`, first at
    /// registration time plus `period`. `period` must be non-zero.
    pub fn add_timer(&self, period: Duration, notify: Rc<dyn TimeNotify>) {
        log::trace!("add timer period={period:?}");
        self.timers.borrow_mut().add(period, notify);
    }

    /// Removes the first timer owned by `notify` in registration order;
    /// no-op if there is none. A handler with several timers removes them
    /// one call at a time.
    pub fn remove_timer(&self, notify: &dyn TimeNotify) {
        log::trace!("remove timer");
        self.timers.borrow_mut().remove_first(notify);
    }

    /// Loops full blocking ticks until [`terminate`](Self::terminate) is
    /// called. The stop flag is checked between ticks, never inside one.
    pub fn run(&self) {
        self.terminated.set(false);
        while !self.terminated.get() {
            self.process_one_event(true);
        }
    }

    /// Stops [`run`](Self::run) after the current tick completes. Does not
    /// interrupt an in-progress wait.
    pub fn terminate(&self) {
        self.terminated.set(true);
    }

    /// Drives one full reactor tick.
    ///
    /// May be called reentrantly from a callback being dispatched; nested
    /// ticks only observe watches marked [`Interest::REENTRANT`], skip the
    /// timer sweep, and skip the notification hook.
    pub fn process_one_event(&self, blocking: bool) {
        let level = self.level.get() + 1;
        self.level.set(level);

        // Queued notifications are not drained reentrantly.
        if level == 1 {
            self.run_hook();
        }

        self.sets.borrow_mut().refresh(&self.watches.borrow());
        let tier = Tier::of_level(level);

        let timeout = self.compute_timeout(level, blocking);

        let events = {
            let sets = self.sets.borrow();
            self.poller
                .borrow_mut()
                .wait(sets.table(tier), Some(timeout))
        };

        if !events.is_empty() {
            // Watches being notified may change the watch list: add fds,
            // remove fds, remove whole handlers. So the walk finishes first,
            // into a stack of notifications to send, and dispatch happens
            // against whatever is still registered afterwards.
            let mut stack = NotifyStack::new();

            for w in self.watches.borrow().iter() {
                if tier == Tier::Nested && !w.interest.contains(Interest::REENTRANT) {
                    continue;
                }

                let ready = events
                    .iter()
                    .filter(|e| e.fd == w.fd)
                    .fold(Interest::empty(), |acc, e| acc | e.readiness);

                let matched = ready & w.interest & Interest::READINESS;
                if !matched.is_empty() {
                    stack.push(w.id, matched);
                }
            }

            while let Some((id, matched)) = stack.pop() {
                let fire = {
                    let watches = self.watches.borrow();
                    watches.get(id).and_then(|w| {
                        // A callback earlier in this drain may have removed
                        // or narrowed the watch; fire only what still holds.
                        let still = matched & w.interest;
                        (!still.is_empty()).then(|| (w.handler.clone(), w.fd, still))
                    })
                };

                if let Some((handler, fd, matched)) = fire {
                    handler.notify_io(fd, matched);
                }
            }
        }

        // Timers run strictly outside the fd dispatch phase, outermost only.
        if level == 1 {
            self.sweep_timers(Instant::now());
            self.run_hook();
        }

        self.level.set(level - 1);
    }

    fn run_hook(&self) {
        if let Some(hook) = &self.hook {
            hook.run();
        }
    }

    /// Base wait of 5s (or zero when non-blocking), shortened at the
    /// outermost level by the nearest timer deadline within a 10s horizon.
    /// Already-due timers are drained here, before the wait, so an overdue
    /// timer fires ahead of the wait rather than after it.
    fn compute_timeout(&self, level: u32, blocking: bool) -> Duration {
        let mut timeout = if blocking { DEFAULT_WAIT } else { Duration::ZERO };

        if level == 1 && !self.timers.borrow().is_empty() {
            let now = Instant::now();
            self.sweep_timers(now);

            if let Some(remaining) = self.timers.borrow().next_within(now, TIMER_HORIZON) {
                timeout = timeout.min(remaining);
            }
        }

        timeout
    }

    /// Fires every due timer in registration order, re-ticking each until
    /// its deadline is back in the future. Works from an id snapshot and
    /// re-looks each timer up per tick, so `notify_time` may add or remove
    /// timers freely.
    fn sweep_timers(&self, now: Instant) {
        let ids = self.timers.borrow().ids();
        for id in ids {
            loop {
                let handler = self.timers.borrow_mut().advance_if_due(id, now);
                match handler {
                    Some(handler) => handler.notify_time(),
                    None => break,
                }
            }
        }
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}
