use fetch_core::{Scheduler, TimerHandle};
use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use std::time::Duration;

/// Schedules on the browser event loop. Dropping the timer handle clears
/// the underlying `setTimeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        yew::platform::spawn_local(future);
    }

    fn schedule(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> TimerHandle {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        TimerHandle::new(Timeout::new(millis, callback))
    }
}
