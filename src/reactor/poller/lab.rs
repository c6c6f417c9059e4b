//! Scripted poller for deterministic tests.

use super::{InterestTable, PollEvent, Poller};
use crate::interest::Interest;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::time::Duration;

/// What one `wait` call was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitCall {
    pub table_id: u64,
    pub entries: Vec<(RawFd, Interest)>,
    pub timeout: Option<Duration>,
}

#[derive(Default)]
struct LabState {
    script: VecDeque<Vec<PollEvent>>,
    calls: Vec<WaitCall>,
}

/// Poller that replays a pre-queued script instead of touching the OS.
///
/// Each `wait` call pops the next batch of events from the script (an empty
/// batch once the script is exhausted) and records what it was asked (table
/// id, entry list, timeout) for later inspection. Cloning yields a handle
/// onto the same shared state, so a test can keep one clone and hand the
/// other to [`ReactorBuilder::poller`](crate::ReactorBuilder::poller).
///
/// # Example
/// ```ignore
/// let lab = LabPoller::new();
/// lab.enqueue(vec![PollEvent::new(7, Interest::READ)]);
///
/// let reactor = ReactorBuilder::new().poller(lab.clone()).build();
/// reactor.process_one_event(true);
///
/// assert_eq!(lab.calls().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct LabPoller {
    state: Rc<RefCell<LabState>>,
}

impl LabPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the batch of events the next unscripted `wait` call reports.
    pub fn enqueue(&self, events: Vec<PollEvent>) {
        self.state.borrow_mut().script.push_back(events);
    }

    /// Every `wait` call observed so far, oldest first.
    pub fn calls(&self) -> Vec<WaitCall> {
        self.state.borrow().calls.clone()
    }
}

impl Poller for LabPoller {
    fn wait(&mut self, table: &InterestTable, timeout: Option<Duration>) -> Vec<PollEvent> {
        let mut state = self.state.borrow_mut();

        state.calls.push(WaitCall {
            table_id: table.id(),
            entries: table.entries().to_vec(),
            timeout,
        });

        state.script.pop_front().unwrap_or_default()
    }
}
