//! Capability traits implemented by reactor collaborators.
//!
//! Handlers are registered as shared trait objects and invoked through `&self`;
//! anything stateful keeps its state behind `Cell`/`RefCell`. Handler identity
//! (for `remove`/`remove_timer`) is the address of the trait object, so a
//! handler may deregister itself from inside its own callback.

use crate::interest::Interest;
use std::os::unix::io::RawFd;

/// Receiver of file-descriptor readiness notifications.
pub trait IoNotify {
    /// Called once per dispatched watch with the descriptor and the subset of
    /// the watch's interest that actually matched this tick.
    fn notify_io(&self, fd: RawFd, matched: Interest);
}

/// Receiver of periodic timer notifications.
pub trait TimeNotify {
    /// Called once per elapsed period, including catch-up ticks after delay.
    fn notify_time(&self);
}

/// External queued-call drainer, run exactly twice per outermost tick
/// (before the wait and after dispatch), never from nested ticks.
///
/// The reactor does not own or construct this collaborator; it is injected
/// through [`ReactorBuilder::notification_hook`](crate::ReactorBuilder).
pub trait NotificationHook {
    /// Drain whatever the collaborator has queued.
    fn run(&self);
}
