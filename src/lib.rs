//! Cooperative single-threaded I/O reactor with periodic timers.
//!
//! This crate provides a callback-driven event loop: collaborators register
//! interest in file descriptors and periodic deadlines, then the reactor
//! multiplexes one blocking wait per tick and dispatches notifications.
//! Callbacks may re-enter the reactor (register, deregister, or even drive a
//! nested tick) while being dispatched.
//!
//! # Architecture
//!
//! - **Reactor**: Runs the tick loop via `run` / `process_one_event`
//! - **WatchRegistry**: Owns (descriptor, interest, handler) registrations
//! - **TimerQueue**: Owns periodic timers with cadence-preserving catch-up
//! - **Poller**: Platform seam for the blocking multiplex wait
//! - **SelectPoller**: Production poller built on `select(2)`
//! - **LabPoller**: Scripted poller for deterministic tests
//! - **ReactorBuilder**: Fluent builder pattern for reactor instantiation

mod builder;
mod interest;
mod notify;
mod reactor;
mod timer;

pub use builder::ReactorBuilder;
pub use interest::Interest;
pub use notify::{IoNotify, NotificationHook, TimeNotify};
pub use reactor::core::Reactor;
pub use reactor::poller::lab::{LabPoller, WaitCall};
pub use reactor::poller::select::SelectPoller;
pub use reactor::poller::{InterestTable, PollEvent, Poller};
