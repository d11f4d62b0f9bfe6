use std::cell::Cell;

use crate::FetchError;

/// Where the most recent fetch cycle stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum CyclePhase {
    /// No cycle has started yet.
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
    /// Settled with a cancellation-kind error.
    Aborted,
}

/// The state cells a fetch hook exposes.
///
/// `data` is not cleared when a later cycle fails unless the hook is
/// configured with [`StaleData::Clear`](crate::StaleData::Clear), so `data`
/// and `error` can both be set after a failed refetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub loading: bool,
    pub phase: CyclePhase,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            phase: CyclePhase::Idle,
        }
    }
}

impl<T> RequestState<T> {
    /// Returns true if this is the initial load (no data yet, currently
    /// loading, and no error).
    pub fn is_initial_loading(&self) -> bool {
        self.loading && self.data.is_none() && self.error.is_none()
    }
}

/// Opaque value whose change forces a new fetch cycle.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
)]
#[display("trigger#{_0}")]
pub struct TriggerToken(u64);

impl TriggerToken {
    /// The token following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Monotonic counter identifying the current fetch cycle.
///
/// A cycle captures the generation it started with; its writes are only
/// applied while that generation is still current.
#[derive(Debug, Default)]
pub(crate) struct Generation(Cell<u64>);

impl Generation {
    pub(crate) fn current(&self) -> u64 {
        self.0.get()
    }

    /// Invalidate every outstanding cycle and return the new generation.
    pub(crate) fn bump(&self) -> u64 {
        let next = self.0.get().wrapping_add(1);
        self.0.set(next);
        next
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.0.get() == generation
    }
}
