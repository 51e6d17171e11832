//! Reachability of the remote simulation, derived from the latest exchange.

/// There is no heartbeat: only polls and commands move this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connectivity {
    reachable: bool,
    consecutive_failures: u32,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self {
            reachable: true,
            consecutive_failures: 0,
        }
    }
}

impl Connectivity {
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Failed exchanges since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns `Some(true)` when this success restores reachability.
    pub fn record_success(&mut self) -> Option<bool> {
        self.consecutive_failures = 0;
        self.set(true)
    }

    /// Returns `Some(false)` when this failure is the first after a reachable period.
    pub fn record_failure(&mut self) -> Option<bool> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.set(false)
    }

    pub fn record<T, E>(&mut self, outcome: &Result<T, E>) -> Option<bool> {
        match outcome {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
    }

    fn set(&mut self, reachable: bool) -> Option<bool> {
        if self.reachable == reachable {
            None
        } else {
            self.reachable = reachable;
            Some(reachable)
        }
    }
}
