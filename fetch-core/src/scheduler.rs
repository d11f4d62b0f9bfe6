//! The event-loop primitives a hook needs from its host: spawning local
//! futures and one-shot timers.

use futures::future::LocalBoxFuture;
use std::time::Duration;

/// Keeps a scheduled timer alive. Dropping the handle cancels the timer if
/// it has not fired yet.
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    _guard: Box<dyn std::any::Any>,
}

impl TimerHandle {
    /// Wrap a host timer whose `Drop` cancels it.
    pub fn new<G: 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

/// Single-threaded scheduling primitives of the host event loop.
pub trait Scheduler {
    /// Run `future` to completion on the current thread.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);

    /// Run `callback` once after `delay`, unless the handle is dropped first.
    fn schedule(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> TimerHandle;
}

#[cfg(feature = "tokio")]
pub use self::tokio_scheduler::TokioScheduler;

#[cfg(feature = "tokio")]
mod tokio_scheduler {
    use super::*;
    use tokio::task::JoinHandle;

    /// Scheduler backed by the current tokio `LocalSet`.
    ///
    /// Both methods must be called from within a `LocalSet`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TokioScheduler;

    struct AbortOnDrop(JoinHandle<()>);

    impl Drop for AbortOnDrop {
        fn drop(&mut self) {
            self.0.abort();
        }
    }

    impl Scheduler for TokioScheduler {
        fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
            tokio::task::spawn_local(future);
        }

        fn schedule(
            &self,
            delay: Duration,
            callback: Box<dyn FnOnce()>,
        ) -> TimerHandle {
            let task = tokio::task::spawn_local(async move {
                tokio::time::sleep(delay).await;
                callback();
            });
            TimerHandle::new(AbortOnDrop(task))
        }
    }
}
