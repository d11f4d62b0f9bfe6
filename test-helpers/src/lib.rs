pub mod mock;
pub mod server;

use fetch_core::{
    FetchHook, HookConfig, RequestState, TokioScheduler, telemetry,
};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

pub use mock::{Call, MockTransport, Scripted};
pub use server::{Canned, CannedServer, spawn_server};

/// A hook wired to a [`MockTransport`] and the tokio scheduler, recording
/// every state notification it emits.
pub struct TestHook<T> {
    pub hook: FetchHook<T>,
    pub transport: MockTransport,
    pub notifications: Rc<RefCell<Vec<RequestState<T>>>>,
}

impl<T> TestHook<T> {
    /// Number of state changes the hook reported so far.
    pub fn notification_count(&self) -> usize {
        self.notifications.borrow().len()
    }
}

impl<T: Clone> TestHook<T> {
    pub fn last_notification(&self) -> Option<RequestState<T>> {
        self.notifications.borrow().last().cloned()
    }
}

/// Create a hook against `transport`. Must be called inside [`run_local`].
pub fn spawn_hook<T>(
    transport: &MockTransport,
    config: HookConfig,
) -> TestHook<T>
where
    T: DeserializeOwned + Clone + 'static,
{
    let hook = FetchHook::new(
        Rc::new(transport.clone()),
        Rc::new(TokioScheduler),
        config,
    );
    let notifications = Rc::new(RefCell::new(Vec::new()));
    {
        let notifications = notifications.clone();
        hook.subscribe(move |state: &RequestState<T>| {
            notifications.borrow_mut().push(state.clone());
        });
    }

    TestHook {
        hook,
        transport: transport.clone(),
        notifications,
    }
}

/// Run `f` on a `LocalSet`, with test logging enabled.
pub async fn run_local<F: Future>(f: F) -> F::Output {
    init_logging();
    LocalSet::new().run_until(f).await
}

/// Let the (paused) clock run for `ms` milliseconds.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Log errors to stderr. Safe to call from every test.
pub fn init_logging() {
    let subscriber = telemetry::get_subscriber("error".into());
    // Only the first test to get here installs the subscriber.
    let _ = telemetry::init_subscriber(subscriber);
}
