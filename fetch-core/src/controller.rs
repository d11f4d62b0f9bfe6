use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::state::Generation;
use crate::{
    AbortController, CyclePhase, FetchError, HookConfig, RequestConfig,
    RequestState, Response, StaleData, Transport,
};

type Listener<T> = Rc<dyn Fn(&RequestState<T>)>;

struct Inner<T> {
    transport: Rc<dyn Transport>,
    config: HookConfig,
    state: RefCell<RequestState<T>>,
    generation: Generation,
    /// Cancellation handle of the current cycle, if one is in flight.
    current: RefCell<Option<AbortController>>,
    detached: Cell<bool>,
    listeners: RefCell<Vec<Listener<T>>>,
}

impl<T: Clone> Inner<T> {
    /// Apply `f` to the state if `generation` is still current and the
    /// consumer is attached, then notify listeners.
    fn update(
        &self,
        generation: u64,
        f: impl FnOnce(&mut RequestState<T>),
    ) -> bool {
        if self.detached.get() {
            tracing::trace!("discarding write to detached fetch state");
            return false;
        }
        if !self.generation.is_current(generation) {
            tracing::trace!(
                "discarding write from stale cycle {} (current {})",
                generation,
                self.generation.current()
            );
            return false;
        }

        f(&mut self.state.borrow_mut());
        self.notify();
        true
    }

    /// Run every listener with the current state.
    ///
    /// Listeners may subscribe, detach or drop the hook while running, so
    /// they are called from a copy of the list. Once one of them detaches,
    /// the rest are skipped.
    fn notify(&self) {
        let snapshot = self.state.borrow().clone();
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            if self.detached.get() {
                break;
            }
            listener(&snapshot);
        }
    }

    fn settle(
        &self,
        generation: u64,
        url: &str,
        result: Result<T, FetchError>,
    ) {
        let stale_data = self.config.stale_data;
        match result {
            Ok(data) => {
                tracing::debug!("fetch of {} succeeded", url);
                self.update(generation, |s| {
                    s.data = Some(data);
                    s.error = None;
                    s.loading = false;
                    s.phase = CyclePhase::Success;
                });
            }
            Err(e) if e.is_abort() => {
                tracing::debug!("fetch of {} aborted", url);
                self.update(generation, |s| {
                    s.loading = false;
                    s.phase = CyclePhase::Aborted;
                });
            }
            Err(e) => {
                tracing::warn!("fetch of {} failed: {} ({})", url, e, e.name());
                self.update(generation, |s| {
                    if stale_data == StaleData::Clear {
                        s.data = None;
                    }
                    s.error = Some(e);
                    s.loading = false;
                    s.phase = CyclePhase::Failed;
                });
            }
        }

        if self.generation.is_current(generation) {
            self.current.borrow_mut().take();
        }
    }
}

impl<T> Inner<T> {
    fn abort_current(&self) {
        if let Some(controller) = self.current.borrow_mut().take() {
            controller.abort();
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(controller) = self.current.get_mut().take() {
            controller.abort();
        }
    }
}

/// Drives fetch cycles for one consumer and owns its [`RequestState`].
///
/// At most one cycle is current. Starting a cycle aborts the previous one,
/// and every state write is checked against the generation the cycle
/// started with, so a superseded cycle can never overwrite newer state.
/// Clones share the same state.
pub struct FetchController<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for FetchController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for FetchController<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> std::fmt::Debug for FetchController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("generation", &self.inner.generation.current())
            .field("in_flight", &self.inner.current.borrow().is_some())
            .field("detached", &self.inner.detached.get())
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned + Clone + 'static> FetchController<T> {
    pub fn new(transport: Rc<dyn Transport>, config: HookConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                transport,
                config,
                state: RefCell::new(RequestState::default()),
                generation: Generation::default(),
                current: RefCell::new(None),
                detached: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Start a new cycle for `url`, superseding any cycle in flight.
    ///
    /// The state switches to loading immediately. The returned future
    /// performs the request and records its outcome; it must be driven by
    /// the host event loop. After [`detach`](Self::detach) this is a no-op.
    pub fn activate(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> LocalBoxFuture<'static, ()> {
        let inner = &self.inner;
        if inner.detached.get() {
            tracing::debug!("ignoring activation of detached fetch {}", url);
            return future::ready(()).boxed_local();
        }

        inner.abort_current();
        let generation = inner.generation.bump();
        let controller = AbortController::new();
        let signal = controller.signal();
        *inner.current.borrow_mut() = Some(controller);

        tracing::debug!("starting fetch cycle {} for {}", generation, url);
        inner.update(generation, |s| {
            s.loading = true;
            s.phase = CyclePhase::Loading;
        });

        let request = inner.transport.perform(url, config, signal);
        let weak: Weak<Inner<T>> = Rc::downgrade(inner);
        let url = url.to_string();

        async move {
            let result = request.await.and_then(Response::decode::<T>);
            if let Some(inner) = weak.upgrade() {
                inner.settle(generation, &url, result);
            }
        }
        .boxed_local()
    }
}

impl<T> FetchController<T> {
    /// Abort the cycle in flight, if any.
    ///
    /// The aborted cycle is still current, so it settles as
    /// [`CyclePhase::Aborted`] and clears `loading`.
    pub fn cancel(&self) {
        self.inner.abort_current();
    }

    /// Detach the consumer: abort the cycle in flight and drop every later
    /// state write and activation.
    pub fn detach(&self) {
        if self.inner.detached.replace(true) {
            return;
        }
        tracing::debug!("detaching fetch controller");
        self.inner.generation.bump();
        self.inner.abort_current();
        self.inner.listeners.borrow_mut().clear();
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.get()
    }

    /// Register a callback run after every applied state change.
    pub fn subscribe(&self, listener: impl Fn(&RequestState<T>) + 'static) {
        if self.is_detached() {
            return;
        }
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn config(&self) -> &HookConfig {
        &self.inner.config
    }

    /// True while a cycle's cancellation handle is held.
    pub fn is_in_flight(&self) -> bool {
        self.inner.current.borrow().is_some()
    }

    pub(crate) fn downgrade(&self) -> WeakController<T> {
        WeakController {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T: Clone> FetchController<T> {
    /// Re-run the listeners with the current state, e.g. to request a
    /// re-render from the host.
    pub fn notify(&self) {
        if !self.is_detached() {
            self.inner.notify();
        }
    }

    pub fn state(&self) -> RequestState<T> {
        self.inner.state.borrow().clone()
    }
}

/// Non-owning reference to a [`FetchController`].
pub(crate) struct WeakController<T> {
    inner: Weak<Inner<T>>,
}

impl<T> WeakController<T> {
    pub(crate) fn upgrade(&self) -> Option<FetchController<T>> {
        self.inner.upgrade().map(|inner| FetchController { inner })
    }
}
