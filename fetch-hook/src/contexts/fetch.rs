use fetch_core::{HookConfig, HttpClient, Transport};
use std::rc::Rc;

/// Transport and configuration shared by every `use_fetch` below a
/// `ContextProvider<FetchContext>`.
#[derive(Clone)]
pub struct FetchContext {
    pub transport: Rc<dyn Transport>,
    pub config: HookConfig,
}

impl FetchContext {
    pub fn new(transport: Rc<dyn Transport>, config: HookConfig) -> Self {
        Self { transport, config }
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self {
            transport: Rc::new(get_http_client()),
            config: HookConfig::default(),
        }
    }
}

impl PartialEq for FetchContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.transport, &other.transport)
            && self.config == other.config
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Default HTTP client - configurable via environment or same-origin
/// fallback.
pub fn get_http_client() -> HttpClient {
    // Try environment variable first (set at build time)
    let base_url = option_env!("BACKEND_URL")
        .map(|url| url.to_string())
        .or_else(|| {
            // Fallback to same origin
            web_sys::window().and_then(|window| window.location().origin().ok())
        });

    if base_url.is_none() {
        tracing::warn!("no BACKEND_URL and no window, using relative urls");
    }

    HttpClient {
        base_url,
        inner_client: reqwest::Client::new(),
    }
}
