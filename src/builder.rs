//! Fluent builder for Reactor construction.
//!
//! Provides a builder pattern interface for creating and configuring Reactor
//! instances: which poller backs the blocking wait, and which (if any)
//! notification hook is drained around each outermost tick.

use crate::notify::NotificationHook;
use crate::reactor::core::Reactor;
use crate::reactor::poller::Poller;
use crate::reactor::poller::select::SelectPoller;

use std::rc::Rc;

/// Builder for constructing [`Reactor`] instances with a fluent API.
///
/// # Example
/// ```ignore
/// let reactor = ReactorBuilder::new()
///     .notification_hook(hook)
///     .build();
/// ```
pub struct ReactorBuilder {
    poller: Option<Box<dyn Poller>>,
    hook: Option<Rc<dyn NotificationHook>>,
}

impl Default for ReactorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactorBuilder {
    pub fn new() -> Self {
        Self {
            poller: None,
            hook: None,
        }
    }

    /// Backs the reactor with a custom poller instead of the default
    /// [`SelectPoller`], typically a [`LabPoller`](crate::LabPoller) in
    /// tests.
    pub fn poller(mut self, poller: impl Poller + 'static) -> Self {
        self.poller = Some(Box::new(poller));
        self
    }

    /// Injects the external queued-call drainer, run exactly twice per
    /// outermost tick (before the wait and after dispatch).
    pub fn notification_hook(mut self, hook: Rc<dyn NotificationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build(self) -> Reactor {
        let poller = self
            .poller
            .unwrap_or_else(|| Box::new(SelectPoller::new()));
        Reactor::from_parts(poller, self.hook)
    }
}
