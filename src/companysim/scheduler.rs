//! Round-based batch scheduler.
//!
//! The [`BatchScheduler`] drives a simulation as a sequence of rounds. Each round:
//!
//! 1. the [`Planner`] produces a [`TaskAssignment`] for the pool;
//! 2. roles are split, in pool order, into batches of at most `max_concurrency`;
//! 3. each batch is launched as one tokio task per role and joined completely
//!    before the next batch starts;
//! 4. every role's full memory is written to the [`RoundLogger`];
//! 5. each role with a non-empty memory reports its latest entry to the planner;
//! 6. the planner summarizes the round.
//!
//! The run ends when a summary says `finished` ([`TerminationReason::Natural`])
//! or after `max_turn` rounds ([`TerminationReason::TurnBudget`]).
//!
//! # Failure isolation
//!
//! A role unit that returns an error, cannot get its workspace, or panics is
//! logged and reported as [`SimulationEvent::RoleFailed`]; its memory stays as it
//! was and the round carries on. Planner errors are fatal and end the run with
//! [`SchedulerError::Planner`]. Nothing is retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use companysim::planner::BroadcastPlanner;
//! use companysim::pool::RolePool;
//! use companysim::scheduler::{BatchScheduler, TerminationReason};
//! # use companysim::role::Role;
//!
//! # async fn demo(roles: Vec<Role>) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = RolePool::new(roles)?;
//! let mut scheduler = BatchScheduler::new(pool, Box::new(BroadcastPlanner::new()))
//!     .with_max_turn(3);
//!
//! let outcome = scheduler.run("Build a todo app", false, 2).await?;
//! match outcome.terminated_by {
//!     TerminationReason::Natural => println!("done after {} rounds", outcome.rounds),
//!     TerminationReason::TurnBudget => println!("gave up after {} rounds", outcome.rounds),
//! }
//! # Ok(())
//! # }
//! ```

use crate::companysim::config::{SimulationConfig, DEFAULT_MAX_TURN};
use crate::companysim::event::{EventHandler, SimulationEvent};
use crate::companysim::planner::{Planner, RoundSummary, TaskAssignment};
use crate::companysim::pool::{RolePool, SharedRole};
use crate::companysim::round_log::{MemoryLogRecord, NoopRoundLogger, RoundLogger};
use crate::companysim::workspace::{FsProvisioner, WorkspaceLayout, WorkspaceProvisioner};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The planner reported the round as finished.
    Natural,
    /// `max_turn` rounds ran without a finished summary.
    TurnBudget,
}

/// Result of [`BatchScheduler::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The last summary the planner produced.
    pub summary: RoundSummary,
    pub terminated_by: TerminationReason,
    /// Number of rounds executed.
    pub rounds: usize,
}

/// Errors that stop a run (or prevent one from starting).
///
/// ```rust
/// use companysim::scheduler::SchedulerError;
///
/// let err = SchedulerError::DuplicateRole("CEO".into());
/// assert_eq!(err.to_string(), "Duplicate role name: CEO");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// [`BatchScheduler::run`] was called on an empty pool.
    NoRoles,
    /// A configuration value is out of range (zero concurrency or turn budget).
    InvalidConfig(String),
    /// Two roles share a name.
    DuplicateRole(String),
    /// The planner could not plan, take feedback, or summarize.
    Planner(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::NoRoles => write!(f, "No roles in pool"),
            SchedulerError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SchedulerError::DuplicateRole(name) => write!(f, "Duplicate role name: {}", name),
            SchedulerError::Planner(msg) => write!(f, "Planner failed: {}", msg),
        }
    }
}

impl Error for SchedulerError {}

fn planner_error(stage: &str, err: Box<dyn Error + Send + Sync>) -> SchedulerError {
    SchedulerError::Planner(format!("{}: {}", stage, err))
}

/// Executes a complex task over a [`RolePool`] in bounded-concurrency rounds.
pub struct BatchScheduler {
    pool: RolePool,
    planner: Box<dyn Planner>,
    logger: Arc<dyn RoundLogger>,
    provisioner: Arc<dyn WorkspaceProvisioner>,
    layout: WorkspaceLayout,
    max_turn: usize,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl BatchScheduler {
    /// Create a scheduler with a 10-turn budget, no round log, filesystem
    /// workspaces under `./workspace/<timestamp>/`, and no event handler.
    pub fn new(pool: RolePool, planner: Box<dyn Planner>) -> Self {
        let defaults = SimulationConfig::default();
        Self {
            pool,
            planner,
            logger: Arc::new(NoopRoundLogger),
            provisioner: Arc::new(FsProvisioner),
            layout: WorkspaceLayout::new(defaults.workspace_root_dir, defaults.run_id),
            max_turn: DEFAULT_MAX_TURN,
            event_handler: None,
        }
    }

    /// Create a scheduler taking turn budget and workspace layout from `config`.
    pub fn from_config(pool: RolePool, planner: Box<dyn Planner>, config: &SimulationConfig) -> Self {
        Self::new(pool, planner)
            .with_max_turn(config.max_turn)
            .with_workspace_layout(WorkspaceLayout::new(
                config.workspace_root_dir.clone(),
                config.run_id.clone(),
            ))
    }

    pub fn with_max_turn(mut self, max_turn: usize) -> Self {
        self.max_turn = max_turn;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RoundLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_provisioner(mut self, provisioner: Arc<dyn WorkspaceProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_workspace_layout(mut self, layout: WorkspaceLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn pool(&self) -> &RolePool {
        &self.pool
    }

    async fn emit(&self, event: SimulationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_simulation_event(&event).await;
        }
    }

    /// Run rounds until the planner reports `finished` or `max_turn` rounds have run.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NoRoles`] for an empty pool,
    /// [`SchedulerError::InvalidConfig`] when `max_concurrency` or the turn
    /// budget is zero, and [`SchedulerError::Planner`] when any planner call fails.
    /// Individual role failures are not errors.
    pub async fn run(
        &mut self,
        complex_task: &str,
        use_tool: bool,
        max_concurrency: usize,
    ) -> Result<RunOutcome, SchedulerError> {
        if self.pool.is_empty() {
            return Err(SchedulerError::NoRoles);
        }
        if max_concurrency == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_turn == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_turn must be at least 1".to_string(),
            ));
        }

        self.emit(SimulationEvent::RunStarted {
            role_count: self.pool.len(),
            max_turn: self.max_turn,
            max_concurrency,
            use_tool,
        })
        .await;

        let mut turn = 0;
        let (summary, terminated_by) = loop {
            let round = turn + 1;
            let summary = self
                .run_round(round, complex_task, use_tool, max_concurrency)
                .await?;

            if summary.finished {
                break (summary, TerminationReason::Natural);
            }

            turn += 1;
            if turn >= self.max_turn {
                break (summary, TerminationReason::TurnBudget);
            }
        };

        let rounds = match terminated_by {
            TerminationReason::Natural => turn + 1,
            TerminationReason::TurnBudget => turn,
        };

        match terminated_by {
            TerminationReason::Natural => {
                log::info!("The simulation is finished after {} round(s).", rounds)
            }
            TerminationReason::TurnBudget => {
                log::info!("Max turn ({}) reached. Ending the simulation.", self.max_turn)
            }
        }

        self.emit(SimulationEvent::RunCompleted {
            rounds,
            finished: summary.finished,
            terminated_by,
        })
        .await;

        Ok(RunOutcome {
            summary,
            terminated_by,
            rounds,
        })
    }

    async fn run_round(
        &mut self,
        round: usize,
        complex_task: &str,
        use_tool: bool,
        max_concurrency: usize,
    ) -> Result<RoundSummary, SchedulerError> {
        log::info!("Round {} started", round);
        self.emit(SimulationEvent::RoundStarted { round }).await;

        let assignment = self
            .planner
            .plan_tasks(complex_task, &self.pool)
            .await
            .map_err(|e| planner_error("plan_tasks", e))?;
        self.emit(SimulationEvent::TasksPlanned {
            round,
            assigned: assignment.len(),
        })
        .await;

        self.execute_batches(round, complex_task, &assignment, use_tool, max_concurrency)
            .await;
        self.log_memory(round).await;
        self.deliver_feedback(round).await?;

        let summary = self
            .planner
            .summarize_round()
            .await
            .map_err(|e| planner_error("summarize_round", e))?;

        log::info!("Round {} completed (finished: {})", round, summary.finished);
        self.emit(SimulationEvent::RoundCompleted {
            round,
            finished: summary.finished,
        })
        .await;

        Ok(summary)
    }

    /// Launch each batch and wait for all of its units before the next one.
    async fn execute_batches(
        &self,
        round: usize,
        complex_task: &str,
        assignment: &TaskAssignment,
        use_tool: bool,
        max_concurrency: usize,
    ) {
        let roles: Vec<(String, SharedRole)> = self
            .pool
            .iter()
            .map(|(name, role)| (name.to_string(), Arc::clone(role)))
            .collect();

        for (batch_index, batch) in roles.chunks(max_concurrency).enumerate() {
            let names: Vec<String> = batch.iter().map(|(name, _)| name.clone()).collect();
            log::debug!("Round {} batch {}: {:?}", round, batch_index, names);
            self.emit(SimulationEvent::BatchStarted {
                round,
                batch: batch_index,
                roles: names,
            })
            .await;

            let units = batch.iter().map(|(name, role)| {
                let role = Arc::clone(role);
                let task = complex_task.to_string();
                let assigned = assignment.task_for(name).map(str::to_string);
                let provisioner = Arc::clone(&self.provisioner);
                let workspace_path = self.layout.path_for(name);

                tokio::spawn(async move {
                    let mut role = role.lock().await;
                    if use_tool {
                        role.perform_task(
                            round,
                            &task,
                            assigned.as_deref(),
                            provisioner.as_ref(),
                            &workspace_path,
                        )
                        .await
                    } else {
                        role.perform_task_without_tools(round, &task, assigned.as_deref())
                            .await
                    }
                })
            });
            let results = join_all(units).await;

            for ((name, _), result) in batch.iter().zip(results) {
                let failure = match result {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(join_error) => Some(format!("task aborted: {}", join_error)),
                };

                match failure {
                    None => {
                        self.emit(SimulationEvent::RoleCompleted {
                            round,
                            role_name: name.clone(),
                        })
                        .await
                    }
                    Some(error) => {
                        log::warn!("Role {} failed in round {}: {}", name, round, error);
                        self.emit(SimulationEvent::RoleFailed {
                            round,
                            role_name: name.clone(),
                            error,
                        })
                        .await
                    }
                }
            }

            self.emit(SimulationEvent::BatchCompleted {
                round,
                batch: batch_index,
            })
            .await;
        }
    }

    async fn log_memory(&self, round: usize) {
        for (name, role) in self.pool.iter() {
            let memory = role.lock().await.memory().to_vec();
            let record = MemoryLogRecord::for_role(round, name, memory);
            if let Err(e) = self.logger.log(&record) {
                log::warn!("Could not log memory of {} for round {}: {}", name, round, e);
            }
        }
    }

    // A role that failed this round still reports its latest earlier entry;
    // planners can tell from `MemoryEntry::round`.
    async fn deliver_feedback(&mut self, round: usize) -> Result<(), SchedulerError> {
        let roles: Vec<(String, SharedRole)> = self
            .pool
            .iter()
            .map(|(name, role)| (name.to_string(), Arc::clone(role)))
            .collect();

        for (name, role) in roles {
            let latest = role.lock().await.last_memory().cloned();
            let Some(entry) = latest else {
                log::debug!("No memory for {} after round {}; skipping feedback", name, round);
                continue;
            };

            self.planner
                .receive_feedback(&name, &entry)
                .await
                .map_err(|e| planner_error("receive_feedback", e))?;
            self.emit(SimulationEvent::FeedbackDelivered {
                round,
                role_name: name,
            })
            .await;
        }

        Ok(())
    }
}
