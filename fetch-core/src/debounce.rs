use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::scheduler::{Scheduler, TimerHandle};

struct Inner {
    delay: Duration,
    scheduler: Rc<dyn Scheduler>,
    callback: Rc<dyn Fn()>,
    pending: RefCell<Option<TimerHandle>>,
}

impl Inner {
    fn fire(&self) {
        // Keep the fired timer's handle until the callback returns; the
        // callback may schedule a new one.
        let _fired = self.pending.borrow_mut().take();
        (self.callback)();
    }
}

/// Trailing-edge debounce of a callback.
///
/// Every [`call`](Debounced::call) restarts the quiet window; the callback
/// runs once, `delay` after the last call. Clones share one timer, and the
/// pending timer is cancelled when the last clone is dropped.
#[derive(Clone)]
pub struct Debounced {
    inner: Rc<Inner>,
}

impl Debounced {
    pub fn new(
        delay: Duration,
        scheduler: Rc<dyn Scheduler>,
        callback: impl Fn() + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                delay,
                scheduler,
                callback: Rc::new(callback),
                pending: RefCell::new(None),
            }),
        }
    }

    pub fn call(&self) {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            self.inner.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire();
                }
            }),
        );
        let superseded = self.inner.pending.replace(Some(handle));
        if superseded.is_some() {
            tracing::trace!("debounce window restarted");
        }
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        let _cancelled = self.inner.pending.borrow_mut().take();
    }

    /// Run the pending call now instead of waiting for the window to end.
    pub fn flush(&self) {
        if self.is_pending() {
            self.inner.fire();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }
}

impl std::fmt::Debug for Debounced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("delay", &self.inner.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
