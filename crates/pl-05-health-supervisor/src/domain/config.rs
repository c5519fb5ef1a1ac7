//! Supervisor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Time between health polls.
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Consecutive desynced polls that trigger a restart. Must be above one
    /// so a single transient reading never restarts the engine.
    pub desync_polls_before_restart: u32,
    /// Restarts allowed inside one window.
    pub restart_budget: usize,
    /// Length of the restart window in seconds.
    pub restart_window_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            desync_polls_before_restart: 2,
            restart_budget: 3,
            restart_window_secs: 900,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
