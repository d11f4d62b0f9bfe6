//! Scripted transport for driving fetch hooks in tests.
//!
//! Replies are registered per url with a delay measured on the tokio clock,
//! so tests running with a paused clock control exactly when each request
//! settles. Every request is recorded together with the abort signal the
//! hook injected, which lets tests assert on cancellation.

use fetch_core::{
    AbortSignal, FetchError, RequestConfig, Response, Transport,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// A reply to hand out for a url.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub delay: Duration,
    pub result: Result<serde_json::Value, FetchError>,
    /// When false the reply is delivered even after the signal fired, like
    /// a transport that ignores cancellation.
    pub honours_abort: bool,
}

/// A request the transport received.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub config: RequestConfig,
    pub signal: AbortSignal,
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<Call>,
}

/// Transport answering from scripted replies.
///
/// Replies for a url are used in registration order; the last one is
/// repeated once the others are used up. Unknown urls fail with a 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, scripted: Scripted) -> &Self {
        self.state
            .borrow_mut()
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    /// Succeed with `data` after `delay_ms`.
    pub fn respond(
        &self,
        url: &str,
        delay_ms: u64,
        data: serde_json::Value,
    ) -> &Self {
        self.script(
            url,
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: Ok(data),
                honours_abort: true,
            },
        )
    }

    /// Fail with `error` after `delay_ms`.
    pub fn fail(&self, url: &str, delay_ms: u64, error: FetchError) -> &Self {
        self.script(
            url,
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: Err(error),
                honours_abort: true,
            },
        )
    }

    /// Succeed with `data` after `delay_ms`, even if aborted in between.
    pub fn respond_ignoring_abort(
        &self,
        url: &str,
        delay_ms: u64,
        data: serde_json::Value,
    ) -> &Self {
        self.script(
            url,
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: Ok(data),
                honours_abort: false,
            },
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.state.borrow().calls.last().cloned()
    }

    fn next_reply(&self, url: &str) -> Scripted {
        let mut state = self.state.borrow_mut();
        match state.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => {
                queue.pop_front().expect("queue is non-empty")
            }
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Scripted {
                delay: Duration::ZERO,
                result: Err(FetchError::Status {
                    status: 404,
                    message: format!("no reply scripted for {url}"),
                }),
                honours_abort: true,
            },
        }
    }
}

impl Transport for MockTransport {
    fn perform(
        &self,
        url: &str,
        config: &RequestConfig,
        signal: AbortSignal,
    ) -> LocalBoxFuture<'static, Result<Response, FetchError>> {
        tracing::debug!("mock transport received {} {}", config.method, url);
        self.state.borrow_mut().calls.push(Call {
            url: url.to_string(),
            config: config.clone(),
            signal: signal.clone(),
        });

        let Scripted {
            delay,
            result,
            honours_abort,
        } = self.next_reply(url);

        let reply = async move {
            tokio::time::sleep(delay).await;
            result.map(Response::ok)
        };

        if honours_abort {
            async move { signal.guard(reply).await }.boxed_local()
        } else {
            reply.boxed_local()
        }
    }
}
