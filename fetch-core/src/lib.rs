//! A cancellable, debounced data-fetching hook.
//!
//! [`FetchHook`] manages the `data` / `error` / `loading` state of one HTTP
//! request tied to a consumer's lifetime. A new cycle starts on the first
//! render and whenever the url, the request config or the refetch trigger
//! change; the cycle in flight is aborted first. `refetch` is debounced.
//!
//! The pieces a UI framework needs to provide are abstracted behind
//! [`Transport`] (the HTTP client) and [`Scheduler`] (spawning and timers),
//! so the hook is framework agnostic and testable on a native runtime.

pub mod abort;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod hook;
pub mod request;
pub mod scheduler;
pub mod state;
pub mod telemetry;
pub mod transport;

pub use abort::{AbortController, AbortSignal};
pub use config::{DEFAULT_DEBOUNCE, HookConfig, StaleData};
pub use controller::FetchController;
pub use debounce::Debounced;
pub use error::{ABORT_ERROR, FetchError};
pub use hook::{FetchHook, FetchHookReturn, Refetch};
pub use request::{Method, RequestConfig};
#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;
pub use scheduler::{Scheduler, TimerHandle};
pub use state::{CyclePhase, RequestState, TriggerToken};
pub use transport::{HttpClient, Response, Transport};
