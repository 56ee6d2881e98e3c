//! Debounced calls - collapse bursts into one execution.
//!
//! Every `call` pushes the deadline to `now + window`; the scheduler runs the
//! action once the deadline has passed with no newer call. A burst of N calls
//! therefore yields exactly one execution, timed from the last call.
//! A zero window means "once on the next frame".

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::Scheduler;

pub(crate) struct DebounceState {
    window: Duration,
    deadline: Cell<Option<Instant>>,
    action: Box<dyn Fn()>,
}

impl DebounceState {
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline.get()
    }

    /// Run the action if due. The deadline is cleared first so the action
    /// may re-arm the debouncer.
    pub(crate) fn poll(&self, now: Instant) -> bool {
        match self.deadline.get() {
            Some(deadline) if deadline <= now => {
                self.deadline.set(None);
                (self.action)();
                true
            }
            _ => false,
        }
    }
}

/// Wrap `action` so that bursts of calls run it once, after `window` of quiet.
pub fn debounce(scheduler: &Scheduler, window: Duration, action: impl Fn() + 'static) -> Debounced {
    let state = Rc::new(DebounceState {
        window,
        deadline: Cell::new(None),
        action: Box::new(action),
    });
    scheduler.register_timer(&state);
    Debounced { state }
}

/// Handle to a debounced action. Dropping every handle cancels it.
#[derive(Clone)]
pub struct Debounced {
    state: Rc<DebounceState>,
}

impl Debounced {
    /// Request a run, timed from now.
    pub fn call(&self) {
        self.call_at(Instant::now());
    }

    /// Request a run, timed from `now`.
    pub fn call_at(&self, now: Instant) {
        self.state.deadline.set(Some(now + self.state.window));
    }

    pub fn is_pending(&self) -> bool {
        self.state.deadline.get().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.state.deadline()
    }

    pub fn window(&self) -> Duration {
        self.state.window
    }

    /// Run a pending call right away. Returns `false` if nothing was pending.
    pub fn flush(&self) -> bool {
        if self.state.deadline.take().is_none() {
            return false;
        }
        (self.state.action)();
        true
    }

    /// Drop a pending call without running it.
    pub fn cancel(&self) {
        self.state.deadline.set(None);
    }
}
