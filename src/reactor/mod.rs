//! Event-driven I/O reactor module.
//!
//! This module provides the cooperative, single-threaded reactor core.
//! It includes:
//! - [`core`]: The tick loop and dispatch machinery
//! - [`registry`]: File-descriptor watch bookkeeping
//! - [`sets`]: Lazily rebuilt two-tier interest tables
//! - [`poller`]: The platform seam for the blocking multiplex wait

pub mod core;
pub mod poller;
pub(crate) mod registry;
pub(crate) mod sets;
