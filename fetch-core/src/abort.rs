//! Cancellation handles for in-flight requests.
//!
//! An [`AbortController`] is owned by exactly one fetch cycle. Its
//! [`AbortSignal`] is handed to the transport, which must settle with
//! [`FetchError::Aborted`] once the signal fires.

use futures::future::{self, Either};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::FetchError;

#[derive(Debug, Default)]
struct Inner {
    aborted: Cell<bool>,
    wakers: RefCell<Vec<Waker>>,
}

/// Owner side of a cancellation handle.
///
/// Dropping the controller does not abort the signal.
#[derive(Debug, Default)]
pub struct AbortController {
    inner: Rc<Inner>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            inner: self.inner.clone(),
        }
    }

    /// Abort the signal, waking every task waiting on it. Idempotent.
    pub fn abort(&self) {
        if self.inner.aborted.replace(true) {
            return;
        }
        let wakers = std::mem::take(&mut *self.inner.wakers.borrow_mut());
        for waker in wakers {
            waker.wake();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.get()
    }
}

/// Observer side of a cancellation handle.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    inner: Rc<Inner>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.get()
    }

    /// Resolves once the signal is aborted.
    pub fn aborted(&self) -> Aborted {
        Aborted {
            signal: self.clone(),
        }
    }

    /// Race `fut` against this signal.
    ///
    /// Settles with [`FetchError::Aborted`] if the signal fires first. An
    /// already-aborted signal short-circuits without polling `fut`, and
    /// `fut` is dropped as soon as the signal wins.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        if self.is_aborted() {
            return Err(FetchError::Aborted);
        }
        let fut = pin!(fut);
        match future::select(fut, self.aborted()).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(FetchError::Aborted),
        }
    }
}

/// Future returned by [`AbortSignal::aborted`].
#[derive(Debug)]
pub struct Aborted {
    signal: AbortSignal,
}

impl Future for Aborted {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let inner = &self.signal.inner;
        if inner.aborted.get() {
            return Poll::Ready(());
        }
        let mut wakers = inner.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
            wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
