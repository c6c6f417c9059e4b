//! `select(2)`-based poller.

use super::{InterestTable, PollEvent, Poller};
use crate::interest::Interest;

use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use std::ptr;
use std::time::Duration;

/// The fd-set triple built once per table, copied per wait.
#[derive(Clone, Copy)]
struct FdSets {
    read: libc::fd_set,
    write: libc::fd_set,
    except: libc::fd_set,
    max_fd: RawFd,
}

impl FdSets {
    fn build(table: &InterestTable) -> Self {
        let mut sets = unsafe {
            FdSets {
                read: mem::zeroed(),
                write: mem::zeroed(),
                except: mem::zeroed(),
                max_fd: -1,
            }
        };

        unsafe {
            libc::FD_ZERO(&mut sets.read);
            libc::FD_ZERO(&mut sets.write);
            libc::FD_ZERO(&mut sets.except);
        }

        for &(fd, interest) in table.entries() {
            unsafe {
                if interest.contains(Interest::READ) {
                    libc::FD_SET(fd, &mut sets.read);
                }
                if interest.contains(Interest::WRITE) {
                    libc::FD_SET(fd, &mut sets.write);
                }
                if interest.contains(Interest::EXCEPT) {
                    libc::FD_SET(fd, &mut sets.except);
                }
            }
            if interest.wants_io() && fd > sets.max_fd {
                sets.max_fd = fd;
            }
        }

        sets
    }
}

/// Production poller built on `select(2)`.
///
/// Keeps the fd-set triple built from each [`InterestTable`] cached by table
/// id: the reactor alternates between its top-level and nested tables, and
/// neither is rebuilt here until its id changes. `select` mutates its
/// arguments, so the cached sets are copied into working sets on every call.
pub struct SelectPoller {
    cache: Vec<(u64, FdSets)>,
}

impl SelectPoller {
    pub fn new() -> Self {
        Self { cache: Vec::new() }
    }

    fn sets_for(&mut self, table: &InterestTable) -> FdSets {
        if let Some((_, sets)) = self.cache.iter().find(|(id, _)| *id == table.id()) {
            return *sets;
        }

        let sets = FdSets::build(table);

        // Two tables (top-level and nested) are live at any time.
        if self.cache.len() >= 2 {
            self.cache.remove(0);
        }
        self.cache.push((table.id(), sets));

        sets
    }
}

impl Default for SelectPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller for SelectPoller {
    fn wait(&mut self, table: &InterestTable, timeout: Option<Duration>) -> Vec<PollEvent> {
        let sets = self.sets_for(table);

        let mut rfd = sets.read;
        let mut wfd = sets.write;
        let mut efd = sets.except;

        let mut tv = timeout.map(|t| libc::timeval {
            tv_sec: t.as_secs() as libc::time_t,
            tv_usec: t.subsec_micros() as libc::suseconds_t,
        });
        let tv_ptr = tv
            .as_mut()
            .map_or(ptr::null_mut(), |tv| tv as *mut libc::timeval);

        let ret = unsafe { libc::select(sets.max_fd + 1, &mut rfd, &mut wfd, &mut efd, tv_ptr) };

        if ret < 0 {
            // Treated as "nothing ready"; the tick proceeds to its timers.
            log::debug!("select failed: {}", io::Error::last_os_error());
            return Vec::new();
        }
        if ret == 0 {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(ret as usize);
        for &(fd, interest) in table.entries() {
            let mut readiness = Interest::empty();

            unsafe {
                if interest.contains(Interest::READ) && libc::FD_ISSET(fd, &rfd) {
                    readiness |= Interest::READ;
                }
                if interest.contains(Interest::WRITE) && libc::FD_ISSET(fd, &wfd) {
                    readiness |= Interest::WRITE;
                }
                if interest.contains(Interest::EXCEPT) && libc::FD_ISSET(fd, &efd) {
                    readiness |= Interest::EXCEPT;
                }
            }

            if !readiness.is_empty() {
                events.push(PollEvent::new(fd, readiness));
            }
        }

        events
    }
}
