//! The simulation environment: a company of roles working on one complex task.
//!
//! [`Environment`] builds the [`RolePool`] from role descriptions, wires the
//! planner, round logger, workspace provisioner and event handler into a
//! [`BatchScheduler`], and runs it with the concurrency cap from its
//! [`SimulationConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use companysim::environment::Environment;
//! use companysim::planner::BroadcastPlanner;
//! use companysim::role::{RoleSpec, TaskPerformer};
//! use companysim::round_log::JsonlRoundLogger;
//! use companysim::SimulationConfig;
//! use std::sync::Arc;
//!
//! # async fn demo(performer: Arc<dyn TaskPerformer>) -> Result<(), Box<dyn std::error::Error>> {
//! let roles = vec![
//!     RoleSpec::new("CEO", "Sets direction"),
//!     RoleSpec::new("CTO", "Owns the architecture").with_tool("shell"),
//! ];
//!
//! let mut env = Environment::new(
//!     roles,
//!     |_spec| Arc::clone(&performer),
//!     Box::new(BroadcastPlanner::new()),
//!     "Ship a URL shortener",
//!     SimulationConfig::default().with_max_turn(5),
//! )?
//! .with_logger(Arc::new(JsonlRoundLogger::new("logs/memory.jsonl")?));
//!
//! let outcome = env.simulate(false).await?;
//! println!("finished: {}", outcome.summary.finished);
//! # Ok(())
//! # }
//! ```

use crate::companysim::config::SimulationConfig;
use crate::companysim::event::EventHandler;
use crate::companysim::planner::Planner;
use crate::companysim::pool::RolePool;
use crate::companysim::role::{Role, RoleSpec, TaskPerformer};
use crate::companysim::round_log::RoundLogger;
use crate::companysim::scheduler::{BatchScheduler, RunOutcome, SchedulerError};
use crate::companysim::workspace::WorkspaceProvisioner;
use std::sync::Arc;

pub struct Environment {
    complex_task: String,
    config: SimulationConfig,
    scheduler: BatchScheduler,
}

impl Environment {
    /// Build the company. `performer_for` supplies the reasoning behaviour of
    /// each role.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::DuplicateRole`] if two descriptions share a name.
    pub fn new<F>(
        roles: Vec<RoleSpec>,
        mut performer_for: F,
        planner: Box<dyn Planner>,
        complex_task: impl Into<String>,
        config: SimulationConfig,
    ) -> Result<Self, SchedulerError>
    where
        F: FnMut(&RoleSpec) -> Arc<dyn TaskPerformer>,
    {
        let roles: Vec<Role> = roles
            .into_iter()
            .map(|spec| {
                let performer = performer_for(&spec);
                Role::from_spec(spec, performer)
            })
            .collect();
        let pool = RolePool::new(roles)?;
        log::info!("Company built with {} role(s)", pool.len());

        let scheduler = BatchScheduler::from_config(pool, planner, &config);
        Ok(Self {
            complex_task: complex_task.into(),
            config,
            scheduler,
        })
    }

    pub fn with_logger(mut self, logger: Arc<dyn RoundLogger>) -> Self {
        self.scheduler = self.scheduler.with_logger(logger);
        self
    }

    pub fn with_provisioner(mut self, provisioner: Arc<dyn WorkspaceProvisioner>) -> Self {
        self.scheduler = self.scheduler.with_provisioner(provisioner);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.scheduler = self.scheduler.with_event_handler(handler);
        self
    }

    pub fn complex_task(&self) -> &str {
        &self.complex_task
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Roles and their memories; read per-role results here after a run.
    pub fn pool(&self) -> &RolePool {
        self.scheduler.pool()
    }

    /// Run the simulation with `config.max_concurrency` units per batch.
    pub async fn simulate(&mut self, use_tool: bool) -> Result<RunOutcome, SchedulerError> {
        log::info!(
            "Simulating \"{}\" (use_tool: {}, max_turn: {}, max_concurrency: {})",
            self.complex_task,
            use_tool,
            self.config.max_turn,
            self.config.max_concurrency
        );
        self.scheduler
            .run(&self.complex_task, use_tool, self.config.max_concurrency)
            .await
    }
}
