//! Timer behavior through the full reactor tick: catch-up, level isolation,
//! and mutation from inside `notify_time`.

use reloop::{Interest, IoNotify, LabPoller, PollEvent, Reactor, ReactorBuilder, TimeNotify};

use std::cell::{Cell, RefCell};
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

struct Ticker(Cell<u32>);

impl Ticker {
    fn new() -> Rc<Self> {
        Rc::new(Self(Cell::new(0)))
    }
}

impl TimeNotify for Ticker {
    fn notify_time(&self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn overdue_timer_catches_up_one_period_at_a_time() {
    let lab = LabPoller::new();
    let reactor = ReactorBuilder::new().poller(lab.clone()).build();

    let ticker = Ticker::new();
    reactor.add_timer(Duration::from_millis(20), ticker.clone());

    // Stall well past three periods before the reactor gets to run.
    thread::sleep(Duration::from_millis(70));
    reactor.process_one_event(false);

    assert!(
        ticker.0.get() >= 3,
        "one catch-up tick per elapsed period, got {}",
        ticker.0.get()
    );
}

struct TraceTicker {
    trace: Rc<RefCell<Vec<&'static str>>>,
}

impl TimeNotify for TraceTicker {
    fn notify_time(&self) {
        self.trace.borrow_mut().push("time");
    }
}

/// Sleeps past the timer deadline mid-callback, then drives a nested tick.
struct SleepyReenter {
    reactor: RefCell<Option<Rc<Reactor>>>,
    trace: Rc<RefCell<Vec<&'static str>>>,
}

impl IoNotify for SleepyReenter {
    fn notify_io(&self, _fd: RawFd, _matched: Interest) {
        self.trace.borrow_mut().push("io");
        thread::sleep(Duration::from_millis(60));

        let reactor = self.reactor.borrow().clone().unwrap();
        reactor.process_one_event(false);

        self.trace.borrow_mut().push("io-done");
    }
}

#[test]
fn timers_fire_outside_dispatch_and_never_from_nested_ticks() {
    let trace = Rc::new(RefCell::new(Vec::new()));
    let lab = LabPoller::new();
    lab.enqueue(vec![PollEvent::new(7, Interest::READ)]);
    lab.enqueue(vec![]);

    let reactor = Rc::new(ReactorBuilder::new().poller(lab.clone()).build());

    reactor.add_timer(
        Duration::from_millis(50),
        Rc::new(TraceTicker {
            trace: trace.clone(),
        }),
    );
    let trigger = Rc::new(SleepyReenter {
        reactor: RefCell::new(Some(reactor.clone())),
        trace: trace.clone(),
    });
    reactor.watch_fd(7, Interest::READ | Interest::REENTRANT, trigger.clone());

    // The timer becomes due during dispatch; the nested tick must not fire
    // it, the enclosing tick's post-dispatch sweep must.
    reactor.process_one_event(true);

    assert_eq!(*trace.borrow(), vec!["io", "io-done", "time"]);
}

/// Removes its own (single) timer the first time it fires.
struct OneShot {
    reactor: RefCell<Option<Rc<Reactor>>>,
    fired: Cell<u32>,
}

impl TimeNotify for OneShot {
    fn notify_time(&self) {
        self.fired.set(self.fired.get() + 1);
        let reactor = self.reactor.borrow().clone().unwrap();
        reactor.remove_timer(self);
    }
}

#[test]
fn removing_a_timer_mid_sweep_is_safe() {
    let lab = LabPoller::new();
    let reactor = Rc::new(ReactorBuilder::new().poller(lab.clone()).build());

    let one_shot = Rc::new(OneShot {
        reactor: RefCell::new(Some(reactor.clone())),
        fired: Cell::new(0),
    });
    let steady = Ticker::new();

    reactor.add_timer(Duration::from_millis(10), one_shot.clone());
    reactor.add_timer(Duration::from_millis(10), steady.clone());

    thread::sleep(Duration::from_millis(25));
    reactor.process_one_event(false);

    assert_eq!(one_shot.fired.get(), 1, "self-removal ends the catch-up");
    assert!(steady.0.get() >= 2, "the sweep continues past the removal");

    // The removed timer never comes back.
    thread::sleep(Duration::from_millis(15));
    reactor.process_one_event(false);
    assert_eq!(one_shot.fired.get(), 1);
}

/// Registers a fresh timer from inside `notify_time`.
struct Spawner {
    reactor: RefCell<Option<Rc<Reactor>>>,
    child: Rc<Ticker>,
    spawned: Cell<bool>,
}

impl TimeNotify for Spawner {
    fn notify_time(&self) {
        if !self.spawned.replace(true) {
            let reactor = self.reactor.borrow().clone().unwrap();
            reactor.add_timer(Duration::from_millis(5), self.child.clone());
        }
    }
}

#[test]
fn adding_a_timer_mid_sweep_is_safe() {
    let lab = LabPoller::new();
    let reactor = Rc::new(ReactorBuilder::new().poller(lab.clone()).build());

    let child = Ticker::new();
    let spawner = Rc::new(Spawner {
        reactor: RefCell::new(Some(reactor.clone())),
        child: child.clone(),
        spawned: Cell::new(false),
    });
    reactor.add_timer(Duration::from_millis(10), spawner.clone());

    thread::sleep(Duration::from_millis(15));
    reactor.process_one_event(false);
    assert!(spawner.spawned.get());
    assert_eq!(child.0.get(), 0, "the new timer's first period starts now");

    thread::sleep(Duration::from_millis(10));
    reactor.process_one_event(false);
    assert!(child.0.get() >= 1);
}
