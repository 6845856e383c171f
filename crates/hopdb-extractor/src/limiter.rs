//! Call pacing and the primary/secondary model state machine.
//!
//! The backend exposes a fast primary model with generous daily quota and a
//! slower secondary with tight limits. All calls go to the current model;
//! a resource-exhausted response demotes the run to the secondary for the
//! rest of the process. The daily budget is a hard cap across both.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    /// Minimum spacing between calls, derived from the model's RPM quota.
    pub min_interval: Duration,
}

pub const PRIMARY_MODEL: ModelSpec = ModelSpec {
    id: "gemma-3-27b-it",
    min_interval: Duration::from_secs(2),
};

pub const SECONDARY_MODEL: ModelSpec = ModelSpec {
    id: "gemini-2.5-flash-lite",
    min_interval: Duration::from_secs(6),
};

#[derive(Debug)]
pub struct RateLimiter {
    current: ModelSpec,
    on_secondary: bool,
    daily_budget: u32,
    calls_made: u32,
    last_call: Option<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(daily_budget: u32) -> Self {
        Self {
            current: PRIMARY_MODEL,
            on_secondary: false,
            daily_budget,
            calls_made: 0,
            last_call: None,
        }
    }

    #[must_use]
    pub fn current_model(&self) -> &ModelSpec {
        &self.current
    }

    #[must_use]
    pub fn calls_made(&self) -> u32 {
        self.calls_made
    }

    #[must_use]
    pub fn budget(&self) -> u32 {
        self.daily_budget
    }

    /// True once the daily budget is spent; callers short-circuit without
    /// touching the network.
    #[must_use]
    pub fn budget_spent(&self) -> bool {
        self.calls_made >= self.daily_budget
    }

    /// Sleeps out the remainder of the current model's minimum interval.
    /// Sub-100ms remainders are tolerated as burst.
    pub async fn wait_turn(&self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.current.min_interval {
                let wait = self.current.min_interval - elapsed;
                if wait > Duration::from_millis(100) {
                    tracing::debug!(
                        model = self.current.id,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "pacing before model call"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Records one call (successful or not) against pacing and budget.
    pub fn record_call(&mut self) {
        self.last_call = Some(Instant::now());
        self.calls_made += 1;
    }

    /// Demotes to the secondary model. Returns `false` if already there,
    /// meaning both models are exhausted.
    pub fn fall_back(&mut self) -> bool {
        if self.on_secondary {
            return false;
        }
        tracing::warn!(
            from = self.current.id,
            to = SECONDARY_MODEL.id,
            "primary model exhausted, switching"
        );
        self.current = SECONDARY_MODEL;
        self.on_secondary = true;
        true
    }
}
