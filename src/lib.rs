//! # companysim
//!
//! companysim runs a simulated company of language-model-backed roles against one
//! complex task. Each round a planner hands out work, roles execute in bounded
//! concurrent batches, their results flow back to the planner as feedback, and the
//! planner decides whether the company is done.
//!
//! The crate provides:
//!
//! * **Roles**: [`role::Role`] with an append-only memory and a pluggable
//!   [`role::TaskPerformer`] where the reasoning step lives
//! * **Scheduling**: [`BatchScheduler`] with strict batch barriers, per-role
//!   failure isolation, and a turn budget
//! * **Planning**: the [`planner::Planner`] trait plus [`planner::BroadcastPlanner`]
//! * **Workspaces**: per-role sandboxed directories for tool-mode execution
//! * **Audit**: [`round_log`] sinks that persist every role's memory after each round
//! * **Observability**: [`event::EventHandler`] callbacks and `log` output
//! * **Datasets**: the logic-grid benchmark loader in [`dataloader`]
//!
//! ## Round Lifecycle
//!
//! ```text
//! plan_tasks ─▶ batch 0 ─▶ batch 1 ─▶ … ─▶ log memory ─▶ feedback ─▶ summarize_round
//!                 │ ▲        │ ▲                                         │
//!                 └─┘        └─┘  (spawn N, join N)                      ▼
//!                                                    finished? ─ yes ─▶ Natural
//!                                                       │ no
//!                                                    turn == max_turn? ─ yes ─▶ TurnBudget
//!                                                       │ no
//!                                                    next round
//! ```
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use companysim::environment::Environment;
//! use companysim::planner::BroadcastPlanner;
//! use companysim::role::{MemoryEntry, RoleResult, RoleSpec, TaskContext, TaskPerformer};
//! use companysim::workspace::Workspace;
//! use companysim::SimulationConfig;
//! use std::sync::Arc;
//!
//! struct Diligent;
//!
//! #[async_trait]
//! impl TaskPerformer for Diligent {
//!     async fn perform_task(&self, ctx: TaskContext<'_>, workspace: &Workspace) -> RoleResult<MemoryEntry> {
//!         workspace.write_file("notes.md", ctx.complex_task).await?;
//!         Ok(MemoryEntry::new(ctx.round, "Wrote notes [TASK_COMPLETE]"))
//!     }
//!
//!     async fn perform_task_without_tools(&self, ctx: TaskContext<'_>) -> RoleResult<MemoryEntry> {
//!         Ok(MemoryEntry::new(ctx.round, "Thought hard [TASK_COMPLETE]"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     companysim::init_logger();
//!
//!     let mut env = Environment::new(
//!         vec![RoleSpec::new("CEO", "Decisive"), RoleSpec::new("CTO", "Curious")],
//!         |_spec| Arc::new(Diligent) as Arc<dyn TaskPerformer>,
//!         Box::new(BroadcastPlanner::new()),
//!         "Launch a bakery website",
//!         SimulationConfig::from_env(),
//!     )?;
//!
//!     let outcome = env.simulate(true).await?;
//!     println!("{:?} after {} round(s)", outcome.terminated_by, outcome.rounds);
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding companysim can opt in to `RUST_LOG` driven
/// diagnostics without choosing a logging backend up front.
///
/// ```rust
/// companysim::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `companysim` module.
pub mod companysim;

// Re-exporting key items for easier external access.
pub use companysim::config;
pub use companysim::config::SimulationConfig;
pub use companysim::dataloader;
pub use companysim::environment;
pub use companysim::environment::Environment;
pub use companysim::event;
pub use companysim::event::{EventHandler, SimulationEvent};
pub use companysim::planner;
pub use companysim::planner::{BroadcastPlanner, Planner, RoundSummary, TaskAssignment};
pub use companysim::pool;
pub use companysim::pool::RolePool;
pub use companysim::role;
pub use companysim::role::{MemoryEntry, Role, RoleSpec, TaskContext, TaskPerformer};
pub use companysim::round_log;
pub use companysim::scheduler;
pub use companysim::scheduler::{BatchScheduler, RunOutcome, SchedulerError, TerminationReason};
pub use companysim::workspace;
