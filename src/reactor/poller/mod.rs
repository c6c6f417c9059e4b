//! Platform seam for the blocking multiplex wait.
//!
//! The reactor never talks to the OS directly; it hands a cached
//! [`InterestTable`] to a [`Poller`] and gets back the descriptors that are
//! ready. [`select::SelectPoller`] is the production implementation,
//! [`lab::LabPoller`] a scripted one for deterministic tests.

pub mod lab;
pub mod select;

use crate::interest::Interest;

use std::os::unix::io::RawFd;
use std::time::Duration;

/// A cached per-tier view of registered interest.
///
/// Each rebuild gets a fresh id, so pollers can key any OS-level structures
/// (fd sets, registration batches) on the id and skip rebuilding them while
/// the table is unchanged.
#[derive(Debug, Clone)]
pub struct InterestTable {
    id: u64,
    entries: Vec<(RawFd, Interest)>,
}

impl InterestTable {
    pub(crate) fn new(id: u64, entries: Vec<(RawFd, Interest)>) -> Self {
        Self { id, entries }
    }

    pub(crate) fn empty() -> Self {
        Self {
            id: 0,
            entries: Vec::new(),
        }
    }

    /// Identity of this build; changes whenever the underlying registrations
    /// changed.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Per-descriptor combined readiness interest, sorted by descriptor.
    pub fn entries(&self) -> &[(RawFd, Interest)] {
        &self.entries
    }
}

/// One readiness report from a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEvent {
    pub fd: RawFd,
    pub readiness: Interest,
}

impl PollEvent {
    pub fn new(fd: RawFd, readiness: Interest) -> Self {
        Self { fd, readiness }
    }
}

/// Blocking multiplex wait over a table of descriptor interests.
pub trait Poller {
    /// Waits up to `timeout` (`None` blocks indefinitely) for any descriptor
    /// in `table` to become ready, and reports what matched.
    ///
    /// Failures do not escape this seam: an implementation that cannot wait
    /// reports no events and the reactor carries on with its timer sweep.
    fn wait(&mut self, table: &InterestTable, timeout: Option<Duration>) -> Vec<PollEvent>;
}
