use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{
    Debounced, FetchController, FetchError, HookConfig, RequestConfig,
    RequestState, Scheduler, Transport, TriggerToken,
};

/// What a fetch hook hands back to its consumer on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchHookReturn<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub loading: bool,
    pub refetch: Refetch,
}

impl<T> FetchHookReturn<T> {
    pub fn new(state: RequestState<T>, refetch: Refetch) -> Self {
        Self {
            data: state.data,
            error: state.error,
            loading: state.loading,
            refetch,
        }
    }

    /// Returns true if this is the initial load (data not yet fetched,
    /// currently loading, and no error).
    pub fn is_initial_loading(&self) -> bool {
        self.loading && self.data.is_none() && self.error.is_none()
    }
}

/// Debounced request for a fresh fetch cycle.
///
/// Calls within the hook's quiet window collapse into one trigger bump,
/// fired after the window elapses from the last call. Clones share one
/// timer. Once closed, calls are ignored.
#[derive(Debug, Clone)]
pub struct Refetch {
    debounced: Debounced,
    open: Rc<Cell<bool>>,
}

impl Refetch {
    pub fn new(debounced: Debounced) -> Self {
        Self {
            debounced,
            open: Rc::new(Cell::new(true)),
        }
    }

    /// A refetch for `controller`, debounced by the controller's configured
    /// window. Each firing advances a trigger token and hands it to
    /// `on_trigger`; nothing happens once the controller is dropped or
    /// detached.
    pub fn for_controller<T: 'static>(
        controller: &FetchController<T>,
        scheduler: Rc<dyn Scheduler>,
        on_trigger: impl Fn(&FetchController<T>, TriggerToken) + 'static,
    ) -> Self {
        let weak = controller.downgrade();
        let latest = Cell::new(TriggerToken::default());
        Self::new(Debounced::new(
            controller.config().debounce,
            scheduler,
            move || {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                if controller.is_detached() {
                    return;
                }
                let next = latest.get().next();
                tracing::debug!("refetch requested, bumping to {}", next);
                latest.set(next);
                on_trigger(&controller, next);
            },
        ))
    }

    pub fn call(&self) {
        if self.open.get() {
            self.debounced.call();
        }
    }

    /// Fire a pending refetch now.
    pub fn flush(&self) {
        self.debounced.flush();
    }

    pub fn cancel(&self) {
        self.debounced.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debounced.is_pending()
    }

    /// Cancel any pending refetch and ignore every later call.
    pub fn close(&self) {
        self.open.set(false);
        self.debounced.cancel();
    }
}

impl PartialEq for Refetch {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.open, &other.open)
    }
}

/// Inputs whose change starts a new cycle.
#[derive(Debug, Clone, PartialEq)]
struct Deps {
    url: String,
    config: RequestConfig,
    trigger: TriggerToken,
}

/// A fetch hook that is not tied to a UI framework.
///
/// The host calls [`render`](Self::render) whenever it renders the
/// consumer and re-renders when a [`subscribe`](Self::subscribe) listener
/// fires. A cycle starts on the first render and whenever the url, the
/// request config or the trigger token changed since the previous render.
///
/// # Example
///
/// ```rust,ignore
/// let hook = FetchHook::<Item>::new(
///     Rc::new(HttpClient::new("https://example.com")),
///     Rc::new(TokioScheduler),
///     HookConfig::from_env(),
/// );
/// let item = hook.render("/items/1", &RequestConfig::get());
/// if item.loading {
///     // ...
/// }
/// item.refetch.call();
/// ```
pub struct FetchHook<T> {
    controller: FetchController<T>,
    scheduler: Rc<dyn Scheduler>,
    trigger: Rc<Cell<TriggerToken>>,
    refetch: Refetch,
    deps: RefCell<Option<Deps>>,
}

impl<T: DeserializeOwned + Clone + 'static> FetchHook<T> {
    pub fn new(
        transport: Rc<dyn Transport>,
        scheduler: Rc<dyn Scheduler>,
        config: HookConfig,
    ) -> Self {
        let controller = FetchController::new(transport, config);
        let trigger = Rc::new(Cell::new(TriggerToken::default()));

        let refetch = {
            let trigger = trigger.clone();
            Refetch::for_controller(
                &controller,
                scheduler.clone(),
                move |controller, next| {
                    trigger.set(next);
                    controller.notify();
                },
            )
        };

        Self {
            controller,
            scheduler,
            trigger,
            refetch,
            deps: RefCell::new(None),
        }
    }

    /// Render the consumer with `url` and `config`.
    ///
    /// Starts a new cycle when the inputs or the trigger token changed
    /// since the previous render, aborting the one in flight.
    pub fn render(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> FetchHookReturn<T> {
        if !self.controller.is_detached() {
            let deps = Deps {
                url: url.to_string(),
                config: config.clone(),
                trigger: self.trigger.get(),
            };
            let changed = self.deps.borrow().as_ref() != Some(&deps);
            if changed {
                *self.deps.borrow_mut() = Some(deps);
                let cycle = self.controller.activate(url, config);
                self.scheduler.spawn(cycle);
            }
        }

        FetchHookReturn::new(self.controller.state(), self.refetch.clone())
    }
}

impl<T: Clone> FetchHook<T> {
    /// Request a fresh fetch, debounced.
    pub fn refetch(&self) {
        self.refetch.call();
    }

    pub fn refetch_handle(&self) -> Refetch {
        self.refetch.clone()
    }

    /// Register a callback asking the host to re-render.
    pub fn subscribe(&self, listener: impl Fn(&RequestState<T>) + 'static) {
        self.controller.subscribe(listener);
    }

    pub fn state(&self) -> RequestState<T> {
        self.controller.state()
    }

    pub fn trigger(&self) -> TriggerToken {
        self.trigger.get()
    }

    pub fn controller(&self) -> &FetchController<T> {
        &self.controller
    }

    /// Detach the consumer: abort the request in flight, cancel any
    /// pending refetch and stop recording state.
    pub fn detach(&self) {
        self.refetch.close();
        self.controller.detach();
    }
}

impl<T> Drop for FetchHook<T> {
    fn drop(&mut self) {
        self.refetch.close();
        self.controller.detach();
    }
}
