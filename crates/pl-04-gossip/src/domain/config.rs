//! Gossip cadence and limits.
//!
//! Broadcast and listen run at the same period so neither side of an
//! exchange outpaces the other:
//!
//! ```text
//! λ = η = 1/√2
//! broadcast = 20·λ ≈ 14.14 s
//! listen    = 20·η ≈ 14.14 s
//! cleanup   = 100·λ ≈ 70.71 s
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::time::Duration;

/// Broadcast-side equilibrium constant.
pub const LAMBDA: f64 = FRAC_1_SQRT_2;

/// Listen-side equilibrium constant.
pub const ETA: f64 = FRAC_1_SQRT_2;

/// Gossip configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    #[serde(with = "duration_millis")]
    pub broadcast_period: Duration,
    #[serde(with = "duration_millis")]
    pub listen_period: Duration,
    #[serde(with = "duration_millis")]
    pub cleanup_period: Duration,
    /// Upper bound on one delivery attempt to one peer.
    #[serde(with = "duration_millis")]
    pub send_timeout: Duration,
    /// Events per transmission; a peer further behind catches up over
    /// several rounds.
    pub max_events_per_message: usize,
    /// Learned peers not heard from for this long are pruned (seconds).
    pub peer_stale_after_secs: u64,
    /// Capacity of the inbound message queue.
    pub inbound_capacity: usize,
    /// Largest accepted wire frame in bytes.
    pub max_frame_len: usize,
    /// An inbound connection idle this long between frames is closed.
    #[serde(with = "duration_millis")]
    pub read_timeout: Duration,
    /// Inbound connections served at once; extra connections are dropped.
    pub max_connections: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            broadcast_period: Duration::from_secs_f64(20.0 * LAMBDA),
            listen_period: Duration::from_secs_f64(20.0 * ETA),
            cleanup_period: Duration::from_secs_f64(100.0 * LAMBDA),
            send_timeout: Duration::from_secs(3),
            max_events_per_message: 256,
            peer_stale_after_secs: 300,
            inbound_capacity: 1_024,
            max_frame_len: 4 * 1024 * 1024,
            read_timeout: Duration::from_secs(10),
            max_connections: 64,
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
