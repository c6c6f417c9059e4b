//! Lazily rebuilt two-tier interest tables.

use super::poller::InterestTable;
use super::registry::WatchRegistry;
use crate::interest::Interest;

use std::collections::BTreeMap;
use std::os::unix::io::RawFd;

/// Which interest view a dispatch frame gets, as a pure function of depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    /// Outermost tick: every watch is visible.
    Top,
    /// Nested tick: only watches marked `REENTRANT` are visible.
    Nested,
}

impl Tier {
    pub(crate) fn of_level(level: u32) -> Tier {
        if level == 1 { Tier::Top } else { Tier::Nested }
    }

    fn admits(self, interest: Interest) -> bool {
        match self {
            Tier::Top => true,
            Tier::Nested => interest.contains(Interest::REENTRANT),
        }
    }
}

/// Caches one [`InterestTable`] per tier, rebuilding both only when the
/// registry generation moved since the last build. Each rebuild hands out
/// fresh table ids so pollers can cache their own OS structures per table.
///
/// Tier membership is per-watch: a descriptor shared by a reentrant and a
/// non-reentrant watch shows up in the nested table with only the reentrant
/// watches' readiness bits.
pub(crate) struct SetBuilder {
    top: InterestTable,
    nested: InterestTable,
    built_at: Option<u64>,
    next_table_id: u64,
}

impl SetBuilder {
    pub(crate) fn new() -> Self {
        Self {
            top: InterestTable::empty(),
            nested: InterestTable::empty(),
            built_at: None,
            next_table_id: 1,
        }
    }

    pub(crate) fn refresh(&mut self, registry: &WatchRegistry) {
        if self.built_at == Some(registry.generation()) {
            return;
        }

        self.top = self.build(registry, Tier::Top);
        self.nested = self.build(registry, Tier::Nested);
        self.built_at = Some(registry.generation());
    }

    pub(crate) fn table(&self, tier: Tier) -> &InterestTable {
        match tier {
            Tier::Top => &self.top,
            Tier::Nested => &self.nested,
        }
    }

    fn build(&mut self, registry: &WatchRegistry, tier: Tier) -> InterestTable {
        let mut combined: BTreeMap<RawFd, Interest> = BTreeMap::new();

        for w in registry.iter() {
            if !tier.admits(w.interest) {
                continue;
            }
            let readiness = w.interest & Interest::READINESS;
            if readiness.is_empty() {
                continue;
            }
            *combined.entry(w.fd).or_insert(Interest::empty()) |= readiness;
        }

        let id = self.next_table_id;
        self.next_table_id += 1;

        InterestTable::new(id, combined.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::IoNotify;
    use std::rc::Rc;

    struct Sink;

    impl IoNotify for Sink {
        fn notify_io(&self, _fd: RawFd, _matched: Interest) {}
    }

    fn registry_with(watches: &[(RawFd, Interest)]) -> WatchRegistry {
        let mut reg = WatchRegistry::new();
        for &(fd, interest) in watches {
            reg.add(fd, interest, Rc::new(Sink));
        }
        reg
    }

    #[test]
    fn combines_interest_per_descriptor() {
        let reg = registry_with(&[(4, Interest::READ), (4, Interest::WRITE), (9, Interest::EXCEPT)]);
        let mut builder = SetBuilder::new();
        builder.refresh(&reg);

        let top = builder.table(Tier::Top);
        assert_eq!(
            top.entries(),
            &[(4, Interest::READ | Interest::WRITE), (9, Interest::EXCEPT)]
        );
    }

    #[test]
    fn nested_table_only_sees_reentrant_watches() {
        let reg = registry_with(&[
            (4, Interest::READ | Interest::REENTRANT),
            (4, Interest::WRITE),
            (9, Interest::READ),
        ]);
        let mut builder = SetBuilder::new();
        builder.refresh(&reg);

        // fd 4 is polled in the nested view with the reentrant watch's bits
        // only; fd 9 is invisible there.
        assert_eq!(builder.table(Tier::Nested).entries(), &[(4, Interest::READ)]);
        assert_eq!(
            builder.table(Tier::Top).entries(),
            &[(4, Interest::READ | Interest::WRITE), (9, Interest::READ)]
        );
    }

    #[test]
    fn refresh_is_lazy_until_generation_moves() {
        let mut reg = registry_with(&[(4, Interest::READ)]);
        let mut builder = SetBuilder::new();

        builder.refresh(&reg);
        let id = builder.table(Tier::Top).id();

        builder.refresh(&reg);
        assert_eq!(builder.table(Tier::Top).id(), id);

        reg.add(5, Interest::READ, Rc::new(Sink));
        builder.refresh(&reg);
        assert_ne!(builder.table(Tier::Top).id(), id);
    }
}
