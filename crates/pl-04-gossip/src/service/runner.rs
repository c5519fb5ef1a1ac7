use super::GossipService;
use crate::domain::LoopKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::info;

/// Ticker whose first tick is one full period after start.
fn periodic(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

impl GossipService {
    /// Spawn the broadcast, listen and cleanup loops.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        LoopKind::ALL
            .iter()
            .map(|kind| tokio::spawn(Arc::clone(self).run_loop(*kind, shutdown.clone())))
            .collect()
    }

    pub fn period(&self, kind: LoopKind) -> Duration {
        match kind {
            LoopKind::Broadcast => self.config.broadcast_period,
            LoopKind::Listen => self.config.listen_period,
            LoopKind::Cleanup => self.config.cleanup_period,
        }
    }

    /// Run one loop until `shutdown` turns `true` or its sender is dropped.
    pub async fn run_loop(self: Arc<Self>, kind: LoopKind, mut shutdown: watch::Receiver<bool>) {
        let period = self.period(kind);
        let mut ticker = periodic(period);
        self.heartbeat(kind).mark_started();
        info!(
            loop_kind = kind.as_str(),
            period_ms = period.as_millis() as u64,
            "[pl-04] 🔁 Gossip loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => match kind {
                    LoopKind::Broadcast => {
                        self.broadcast_once().await;
                    }
                    LoopKind::Listen => {
                        self.listen_once();
                    }
                    LoopKind::Cleanup => {
                        self.cleanup_once();
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.heartbeat(kind).mark_stopped();
        info!(loop_kind = kind.as_str(), "[pl-04] Gossip loop stopped");
    }
}
