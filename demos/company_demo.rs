//! Runs a small simulated company with scripted roles.
//!
//! Each role "works" for a random-ish number of rounds before declaring its part
//! complete, so the run shows batching, feedback and natural termination.
//!
//! Run with:
//!   RUST_LOG=info MAX_THREADS=2 cargo run --example company_demo [roles.json]

use async_trait::async_trait;
use companysim::event::{EventHandler, SimulationEvent};
use companysim::planner::{BroadcastPlanner, DEFAULT_COMPLETION_MARKER};
use companysim::role::{MemoryEntry, RoleResult, RoleSpec, TaskContext, TaskPerformer};
use companysim::round_log::JsonlRoundLogger;
use companysim::workspace::Workspace;
use companysim::{Environment, SimulationConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Finishes after `rounds_needed` rounds of work.
struct ScriptedEmployee {
    rounds_needed: usize,
}

impl ScriptedEmployee {
    fn report(&self, ctx: &TaskContext<'_>, extra: &str) -> MemoryEntry {
        let done = ctx.memory.len() + 1 >= self.rounds_needed;
        let status = if done { DEFAULT_COMPLETION_MARKER } else { "in progress" };
        MemoryEntry::new(
            ctx.round,
            format!("{} worked on round {}{} {}", ctx.name, ctx.round, extra, status),
        )
        .with_metadata("persona", ctx.persona)
    }
}

#[async_trait]
impl TaskPerformer for ScriptedEmployee {
    async fn perform_task(
        &self,
        ctx: TaskContext<'_>,
        workspace: &Workspace,
    ) -> RoleResult<MemoryEntry> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let file = format!("round_{}.md", ctx.round);
        workspace
            .write_file(&file, ctx.assignment.unwrap_or(ctx.complex_task))
            .await?;
        Ok(self.report(&ctx, &format!(" (wrote {})", file)))
    }

    async fn perform_task_without_tools(&self, ctx: TaskContext<'_>) -> RoleResult<MemoryEntry> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(self.report(&ctx, ""))
    }
}

struct ConsoleEvents;

#[async_trait]
impl EventHandler for ConsoleEvents {
    async fn on_simulation_event(&self, event: &SimulationEvent) {
        match event {
            SimulationEvent::BatchStarted { round, batch, roles } => {
                println!("[round {}] batch {} -> {}", round, batch, roles.join(", "))
            }
            SimulationEvent::RoleFailed {
                role_name, error, ..
            } => println!("  {} failed: {}", role_name, error),
            SimulationEvent::RoundCompleted { round, finished } => {
                println!("[round {}] finished: {}", round, finished)
            }
            SimulationEvent::RunCompleted {
                rounds,
                terminated_by,
                ..
            } => println!("run ended after {} round(s): {:?}", rounds, terminated_by),
            _ => {}
        }
    }
}

fn default_roles() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new("CEO", "Sets priorities and keeps everyone aligned"),
        RoleSpec::new("CTO", "Designs the architecture").with_tool("shell"),
        RoleSpec::new("Engineer", "Writes the code").with_tool("shell"),
        RoleSpec::new("QA", "Breaks things on purpose").with_tool("browser"),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    companysim::init_logger();

    let roles = match std::env::args().nth(1) {
        Some(path) => RoleSpec::load_all(Path::new(&path))?,
        None => default_roles(),
    };

    let config = SimulationConfig::from_env();
    let log_path = config
        .workspace_root_dir
        .join(&config.run_id)
        .join("memory.jsonl");
    let use_tool = config.use_tool;

    let mut env = Environment::new(
        roles,
        |spec| {
            Arc::new(ScriptedEmployee {
                rounds_needed: 1 + spec.name.len() % 3,
            }) as Arc<dyn TaskPerformer>
        },
        Box::new(BroadcastPlanner::new()),
        "Build and launch a URL shortener",
        config,
    )?
    .with_logger(Arc::new(JsonlRoundLogger::new(&log_path)?))
    .with_event_handler(Arc::new(ConsoleEvents));

    let outcome = env.simulate(use_tool).await?;
    println!("summary: {}", outcome.summary.details);

    for (name, role) in env.pool().iter() {
        let role = role.lock().await;
        println!("{}: {} memory entries", name, role.memory().len());
    }
    println!("memory log: {}", log_path.display());

    Ok(())
}
