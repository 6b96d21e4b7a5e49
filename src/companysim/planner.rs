//! Planner abstraction: who does what each round, and is the work done.
//!
//! The [`BatchScheduler`](crate::scheduler::BatchScheduler) calls a [`Planner`]
//! three ways per round:
//!
//! 1. [`plan_tasks`](Planner::plan_tasks) once, before any role runs;
//! 2. [`receive_feedback`](Planner::receive_feedback) once per role that has a
//!    memory entry after the round;
//! 3. [`summarize_round`](Planner::summarize_round) once, after all feedback.
//!
//! Any error from these calls ends the run.
//!
//! [`BroadcastPlanner`] is a small reference implementation that hands the same
//! task to every role and declares the round finished once every reporting role
//! signals completion with a marker.

use crate::companysim::pool::RolePool;
use crate::companysim::role::MemoryEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::error::Error;

pub type PlannerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Per-role task text for one round.
///
/// ```rust
/// use companysim::planner::TaskAssignment;
///
/// let mut assignment = TaskAssignment::new();
/// assignment.assign("CTO", "Design the storage layer");
/// assert_eq!(assignment.task_for("CTO"), Some("Design the storage layer"));
/// assert_eq!(assignment.task_for("CEO"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    tasks: HashMap<String, String>,
}

impl TaskAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, role_name: impl Into<String>, task: impl Into<String>) {
        self.tasks.insert(role_name.into(), task.into());
    }

    pub fn task_for(&self, role_name: &str) -> Option<&str> {
        self.tasks.get(role_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The planner's verdict on a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub finished: bool,
    /// Free-form diagnostics; not interpreted by the scheduler.
    #[serde(default)]
    pub details: Value,
}

impl RoundSummary {
    pub fn finished() -> Self {
        Self {
            finished: true,
            details: Value::Null,
        }
    }

    pub fn unfinished() -> Self {
        Self {
            finished: false,
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Assigns work and judges completion.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce this round's assignment. Called again every round with the same
    /// task, by which time roles carry more memory.
    async fn plan_tasks(
        &mut self,
        complex_task: &str,
        pool: &RolePool,
    ) -> PlannerResult<TaskAssignment>;

    /// Receive the most recent memory entry of one role.
    async fn receive_feedback(&mut self, role_name: &str, entry: &MemoryEntry)
        -> PlannerResult<()>;

    /// Judge the round once all feedback is in.
    async fn summarize_round(&mut self) -> PlannerResult<RoundSummary>;
}

/// Marker a role includes in its result to tell [`BroadcastPlanner`] it is done.
pub const DEFAULT_COMPLETION_MARKER: &str = "[TASK_COMPLETE]";

/// Gives every role the complex task and finishes when all reporting roles are done.
///
/// A round is finished when at least one role reported and every role that
/// reported included the completion marker in its latest entry.
///
/// ```rust
/// use companysim::planner::{BroadcastPlanner, Planner};
/// use companysim::role::MemoryEntry;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let mut planner = BroadcastPlanner::new();
/// planner.receive_feedback("CTO", &MemoryEntry::new(1, "Shipped it [TASK_COMPLETE]")).await?;
/// planner.receive_feedback("QA", &MemoryEntry::new(1, "Still testing")).await?;
/// assert!(!planner.summarize_round().await?.finished);
///
/// planner.receive_feedback("QA", &MemoryEntry::new(2, "All green [TASK_COMPLETE]")).await?;
/// planner.receive_feedback("CTO", &MemoryEntry::new(2, "[TASK_COMPLETE]")).await?;
/// assert!(planner.summarize_round().await?.finished);
/// # Ok(())
/// # }
/// ```
pub struct BroadcastPlanner {
    completion_marker: String,
    round_feedback: Vec<(String, bool)>,
    rounds_summarized: usize,
}

impl BroadcastPlanner {
    pub fn new() -> Self {
        Self {
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            round_feedback: Vec::new(),
            rounds_summarized: 0,
        }
    }

    pub fn with_completion_marker(mut self, marker: impl Into<String>) -> Self {
        self.completion_marker = marker.into();
        self
    }
}

impl Default for BroadcastPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Planner for BroadcastPlanner {
    async fn plan_tasks(
        &mut self,
        complex_task: &str,
        pool: &RolePool,
    ) -> PlannerResult<TaskAssignment> {
        let mut assignment = TaskAssignment::new();
        for (name, role) in pool.iter() {
            let persona = role.lock().await.persona().to_string();
            assignment.assign(
                name,
                format!(
                    "As {} ({}), contribute to: {}\nWhen your part is done, include {} in your reply.",
                    name, persona, complex_task, self.completion_marker
                ),
            );
        }
        Ok(assignment)
    }

    async fn receive_feedback(
        &mut self,
        role_name: &str,
        entry: &MemoryEntry,
    ) -> PlannerResult<()> {
        let done = entry.content.contains(&self.completion_marker);
        log::debug!("Feedback from {} (done: {})", role_name, done);
        self.round_feedback.push((role_name.to_string(), done));
        Ok(())
    }

    async fn summarize_round(&mut self) -> PlannerResult<RoundSummary> {
        let feedback = std::mem::take(&mut self.round_feedback);
        self.rounds_summarized += 1;

        let reported: Vec<&str> = feedback.iter().map(|(name, _)| name.as_str()).collect();
        let completed: Vec<&str> = feedback
            .iter()
            .filter(|(_, done)| *done)
            .map(|(name, _)| name.as_str())
            .collect();
        let finished = !feedback.is_empty() && completed.len() == feedback.len();

        Ok(RoundSummary {
            finished,
            details: json!({
                "round": self.rounds_summarized,
                "reported": reported,
                "completed": completed,
            }),
        })
    }
}
