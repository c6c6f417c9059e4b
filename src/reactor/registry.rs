//! File-descriptor watch bookkeeping.

use crate::interest::Interest;
use crate::notify::IoNotify;

use std::os::unix::io::RawFd;
use std::ptr;
use std::rc::Rc;

pub(crate) type WatchId = u64;

/// One (descriptor, interest, handler) registration.
pub(crate) struct Watch {
    pub(crate) id: WatchId,
    pub(crate) fd: RawFd,
    pub(crate) interest: Interest,
    pub(crate) handler: Rc<dyn IoNotify>,
}

impl Watch {
    pub(crate) fn owned_by(&self, notify: &dyn IoNotify) -> bool {
        // Identity is the trait object's data address, so a handler can say
        // "remove me" from inside its own callback.
        ptr::addr_eq(Rc::as_ptr(&self.handler), notify as *const dyn IoNotify)
    }
}

/// Owns all watches and tracks a generation counter that moves on every
/// structural change. Consumers (the set builder) compare generations to
/// rebuild lazily instead of on every tick.
pub(crate) struct WatchRegistry {
    watches: Vec<Watch>,
    next_id: WatchId,
    generation: u64,
}

impl WatchRegistry {
    pub(crate) fn new() -> Self {
        Self {
            watches: Vec::new(),
            next_id: 1,
            generation: 0,
        }
    }

    /// Appends a new watch. Duplicates are legal and stay independently
    /// removable; no merging happens here.
    pub(crate) fn add(&mut self, fd: RawFd, interest: Interest, handler: Rc<dyn IoNotify>) {
        let id = self.next_id;
        self.next_id += 1;

        self.watches.push(Watch {
            id,
            fd,
            interest,
            handler,
        });
        self.generation += 1;
    }

    /// Clears `mask` from every watch owned by `notify`; watches whose
    /// interest ends up empty are dropped. No-op for unknown handlers.
    pub(crate) fn remove(&mut self, notify: &dyn IoNotify, mask: Interest) {
        for w in &mut self.watches {
            if w.owned_by(notify) {
                w.interest -= mask;
            }
        }
        self.watches.retain(|w| !w.interest.is_empty());
        self.generation += 1;
    }

    pub(crate) fn get(&self, id: WatchId) -> Option<&Watch> {
        self.watches.iter().find(|w| w.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Watch> {
        self.watches.iter()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}
