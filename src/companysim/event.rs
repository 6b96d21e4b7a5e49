//! Simulation event system.
//!
//! Implement [`EventHandler`] to observe a run as it happens: run and round
//! boundaries, each batch launch and join, every role unit's outcome, feedback
//! delivery, and the final termination reason.
//!
//! # Event Flow (one round, pool `[A, B, C]`, concurrency 2)
//!
//! ```text
//! RoundStarted { round: 1 }
//!   ├─ TasksPlanned
//!   ├─ BatchStarted { batch: 0, roles: [A, B] }
//!   │    ├─ RoleCompleted { A }
//!   │    └─ RoleFailed { B }
//!   ├─ BatchCompleted { batch: 0 }
//!   ├─ BatchStarted { batch: 1, roles: [C] }
//!   │    └─ RoleCompleted { C }
//!   ├─ BatchCompleted { batch: 1 }
//!   ├─ FeedbackDelivered { A }, FeedbackDelivered { C }
//! RoundCompleted { round: 1, finished: false }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use companysim::event::{EventHandler, SimulationEvent};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_simulation_event(&self, event: &SimulationEvent) {
//!         if let SimulationEvent::RoleFailed { role_name, error, .. } = event {
//!             eprintln!("{} failed: {}", role_name, error);
//!         }
//!     }
//! }
//! ```

use crate::companysim::scheduler::TerminationReason;
use async_trait::async_trait;

/// Events emitted by the [`BatchScheduler`](crate::scheduler::BatchScheduler).
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// `run()` passed validation and is about to start round 1.
    RunStarted {
        role_count: usize,
        max_turn: usize,
        max_concurrency: usize,
        use_tool: bool,
    },

    RoundStarted {
        round: usize,
    },

    /// The planner produced this round's assignment.
    TasksPlanned {
        round: usize,
        assigned: usize,
    },

    /// A batch of role units was launched together.
    BatchStarted {
        round: usize,
        batch: usize,
        roles: Vec<String>,
    },

    /// Every unit of the batch has finished, successfully or not.
    BatchCompleted {
        round: usize,
        batch: usize,
    },

    /// A role unit finished and its memory grew by one entry.
    RoleCompleted {
        round: usize,
        role_name: String,
    },

    /// A role unit failed (error, provisioning failure, or panic). The role's
    /// memory is unchanged for this round.
    RoleFailed {
        round: usize,
        role_name: String,
        error: String,
    },

    FeedbackDelivered {
        round: usize,
        role_name: String,
    },

    RoundCompleted {
        round: usize,
        finished: bool,
    },

    RunCompleted {
        rounds: usize,
        finished: bool,
        terminated_by: TerminationReason,
    },
}

/// Receives [`SimulationEvent`]s. The default implementation ignores them.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_simulation_event(&self, _event: &SimulationEvent) {}
}
