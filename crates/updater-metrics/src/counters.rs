//! Outcome counters — one monotonic atomic per trigger outcome.
//!
//! Both series start at zero on construction so the exposition lists them
//! before the first request arrives.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

/// Successful trigger classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The patch scheduled a new rollout.
    Triggered,
    /// The patch was accepted but nothing needs to roll out.
    NoOp,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Triggered, Outcome::NoOp];

    /// Value of the `action` label.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Triggered => "triggered",
            Outcome::NoOp => "no-op",
        }
    }

    pub fn from_triggered(triggered: bool) -> Self {
        if triggered {
            Outcome::Triggered
        } else {
            Outcome::NoOp
        }
    }
}

/// Process-wide trigger counters. Never reset.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    triggered: AtomicU64,
    noop: AtomicU64,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::Triggered => &self.triggered,
            Outcome::NoOp => &self.noop,
        }
    }

    /// Add one to the counter for `outcome`.
    pub fn increment(&self, outcome: Outcome) {
        let value = self.slot(outcome).fetch_add(1, Ordering::Relaxed) + 1;
        trace!(action = outcome.label(), value, "outcome counter incremented");
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        self.slot(outcome).load(Ordering::Relaxed)
    }

    /// Current value of every series, in label order.
    pub fn snapshot(&self) -> [(Outcome, u64); 2] {
        Outcome::ALL.map(|o| (o, self.get(o)))
    }
}
