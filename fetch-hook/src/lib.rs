//! Yew bindings for [`fetch_core`].
//!
//! [`use_fetch`] ties one cancellable request to a component: it fetches on
//! mount and whenever its inputs change, aborts the request in flight when
//! superseded or unmounted, and exposes a debounced `refetch`.

mod contexts;
pub mod hooks;
mod logs;
mod scheduler;

pub use contexts::fetch::{FetchContext, get_http_client};
pub use fetch_core::{
    FetchError, FetchHookReturn, HookConfig, Method, Refetch, RequestConfig,
    StaleData, Transport,
};
pub use hooks::{use_fetch, use_fetch_with};
pub use logs::init_logging;
pub use scheduler::GlooScheduler;
