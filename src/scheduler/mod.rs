//! Scheduler - Frame-driven deferred work
//!
//! A single-threaded queue of work that runs on the host's next frame.
//! The host calls [`Scheduler::tick`] once per frame (e.g. every event-loop
//! iteration); each tick runs:
//!
//! 1. Every task deferred *before* the tick started (tasks deferred while a
//!    tick runs wait for the next one)
//! 2. Every debounced call whose quiet window has elapsed
//!
//! # Example
//!
//! ```ignore
//! use folio_texts::scheduler::{debounce, Scheduler};
//! use std::time::{Duration, Instant};
//!
//! let scheduler = Scheduler::new();
//! scheduler.defer(|| println!("next frame"));
//!
//! let refresh = debounce(&scheduler, Duration::from_millis(16), || println!("settled"));
//! refresh.call();
//! refresh.call();
//!
//! scheduler.tick(Instant::now());
//! ```

pub mod debounce;

pub use debounce::{debounce, Debounced};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Instant;

use debounce::DebounceState;

/// Upper bound on ticks for `run_until_idle`, so self-rescheduling work
/// cannot spin forever.
pub const MAX_IDLE_TICKS: usize = 1024;

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerInner {
    deferred: RefCell<VecDeque<Task>>,
    timers: RefCell<Vec<Weak<DebounceState>>>,
    ticks: Cell<u64>,
}

/// Handle to a frame-driven work queue. Cloning shares the queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the next tick.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.deferred.borrow_mut().push_back(Box::new(task));
    }

    /// Run one frame of work. Returns the number of tasks and debounced
    /// calls that executed.
    pub fn tick(&self, now: Instant) -> usize {
        self.inner.ticks.set(self.inner.ticks.get() + 1);

        // Take the batch first; tasks may defer more work
        let batch: Vec<Task> = self.inner.deferred.borrow_mut().drain(..).collect();
        let mut ran = batch.len();
        for task in batch {
            task();
        }

        for timer in self.live_timers() {
            if timer.poll(now) {
                ran += 1;
            }
        }

        ran
    }

    /// Tick until no deferred task is queued and no debounced call is due
    /// at `now`. Returns the total number of executions.
    pub fn run_until_idle(&self, now: Instant) -> usize {
        let mut ran = 0;
        for _ in 0..MAX_IDLE_TICKS {
            if !self.has_due_work(now) {
                return ran;
            }
            ran += self.tick(now);
        }
        tracing::warn!(ticks = MAX_IDLE_TICKS, "scheduler still busy after tick limit");
        ran
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending_tasks(&self) -> usize {
        self.inner.deferred.borrow().len()
    }

    /// Earliest deadline among pending debounced calls.
    ///
    /// Hosts can use it to size their event-poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.live_timers().iter().filter_map(|timer| timer.deadline()).min()
    }

    /// True if nothing is queued and no debounced call is pending.
    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0 && self.next_deadline().is_none()
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.inner.ticks.get()
    }

    fn has_due_work(&self, now: Instant) -> bool {
        self.pending_tasks() > 0 || self.next_deadline().is_some_and(|deadline| deadline <= now)
    }

    pub(crate) fn register_timer(&self, timer: &Rc<DebounceState>) {
        self.inner.timers.borrow_mut().push(Rc::downgrade(timer));
    }

    /// Upgrade live timers, pruning the dropped ones.
    fn live_timers(&self) -> Vec<Rc<DebounceState>> {
        let mut timers = self.inner.timers.borrow_mut();
        timers.retain(|timer| timer.strong_count() > 0);
        timers.iter().filter_map(Weak::upgrade).collect()
    }
}
