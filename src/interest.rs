//! Interest masks for file-descriptor watches.

use bitflags::bitflags;

bitflags! {
    /// What a watch wants to hear about, plus where it may hear it.
    ///
    /// `READ`, `WRITE` and `EXCEPT` select OS readiness kinds. `REENTRANT`
    /// is not a readiness kind: it marks the watch as visible from nested
    /// reactor ticks (a tick driven from inside a callback). Watches without
    /// it are only ever dispatched from the outermost tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Interest: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXCEPT = 1 << 2;
        const REENTRANT = 1 << 3;

        /// Every bit, readiness and reentrancy alike. Handy for full removal.
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::EXCEPT.bits() | Self::REENTRANT.bits();
    }
}

impl Interest {
    /// The readiness kinds only (`READ | WRITE | EXCEPT`).
    pub const READINESS: Interest = Interest::READ.union(Interest::WRITE).union(Interest::EXCEPT);

    /// True if the mask carries at least one readiness bit.
    pub fn wants_io(self) -> bool {
        self.intersects(Interest::READINESS)
    }
}
