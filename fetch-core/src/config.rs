use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quiet period after the last `refetch` call before a new cycle starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);

/// What happens to previously fetched data when a later cycle fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleData {
    /// Keep showing the last successful payload next to the error.
    #[default]
    Keep,
    /// Clear `data` whenever an error is recorded.
    Clear,
}

/// Per-hook behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    #[serde(with = "millis")]
    pub debounce: Duration,
    pub stale_data: StaleData,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            stale_data: StaleData::Keep,
        }
    }
}

impl HookConfig {
    /// Defaults, overridden by environment variables where set.
    ///
    /// - FETCH_DEBOUNCE_MS: refetch quiet period in milliseconds
    /// - FETCH_STALE_DATA: `keep` or `clear`
    ///
    /// Unparseable values are logged and ignored. Meant for native hosts;
    /// in the browser there is no process environment and the defaults
    /// apply.
    pub fn from_env() -> Self {
        use std::env::var;

        let mut config = Self::default();

        if let Ok(ms) = var("FETCH_DEBOUNCE_MS") {
            match ms.trim().parse::<u64>() {
                Ok(ms) => config.debounce = Duration::from_millis(ms),
                Err(e) => {
                    tracing::warn!("ignoring FETCH_DEBOUNCE_MS={ms:?}: {e}")
                }
            }
        }

        if let Ok(policy) = var("FETCH_STALE_DATA") {
            match policy.trim().to_ascii_lowercase().as_str() {
                "keep" => config.stale_data = StaleData::Keep,
                "clear" => config.stale_data = StaleData::Clear,
                other => {
                    tracing::warn!("ignoring FETCH_STALE_DATA={other:?}")
                }
            }
        }

        config
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_stale_data(mut self, stale_data: StaleData) -> Self {
        self.stale_data = stale_data;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
