//! Sliding-window restart budget.

use std::collections::VecDeque;

/// At most `max_restarts` restarts in any `window_secs` span.
#[derive(Debug, Clone)]
pub struct RestartBudget {
    max_restarts: usize,
    window_secs: u64,
    restarts: VecDeque<u64>,
}

impl RestartBudget {
    pub fn new(max_restarts: usize, window_secs: u64) -> Self {
        Self {
            max_restarts,
            window_secs,
            restarts: VecDeque::with_capacity(max_restarts),
        }
    }

    fn expire(&mut self, now: u64) {
        let cutoff = now.saturating_sub(self.window_secs);
        while self.restarts.front().is_some_and(|t| *t <= cutoff) {
            self.restarts.pop_front();
        }
    }

    /// Record a restart at `now` if the window has room.
    pub fn try_consume(&mut self, now: u64) -> bool {
        self.expire(now);
        if self.restarts.len() >= self.max_restarts {
            return false;
        }
        self.restarts.push_back(now);
        true
    }

    /// Restarts inside the window ending at `now`.
    pub fn used(&mut self, now: u64) -> usize {
        self.expire(now);
        self.restarts.len()
    }

    pub fn max_restarts(&self) -> usize {
        self.max_restarts
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn last(&self) -> Option<u64> {
        self.restarts.back().copied()
    }
}
