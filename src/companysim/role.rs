//! Roles: the simulated employees of a company.
//!
//! A [`Role`] pairs an identity (name, persona, tool list) with an append-only
//! memory of [`MemoryEntry`] results and a [`TaskPerformer`] that does the actual
//! work for a round. The performer is where language-model reasoning plugs in;
//! this crate only decides *when* it runs.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use companysim::role::{MemoryEntry, Role, RoleResult, RoleSpec, TaskContext, TaskPerformer};
//! use companysim::workspace::Workspace;
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl TaskPerformer for Echo {
//!     async fn perform_task(
//!         &self,
//!         ctx: TaskContext<'_>,
//!         _workspace: &Workspace,
//!     ) -> RoleResult<MemoryEntry> {
//!         self.perform_task_without_tools(ctx).await
//!     }
//!
//!     async fn perform_task_without_tools(&self, ctx: TaskContext<'_>) -> RoleResult<MemoryEntry> {
//!         Ok(MemoryEntry::new(ctx.round, format!("{} did: {}", ctx.name, ctx.assignment.unwrap_or("nothing"))))
//!     }
//! }
//!
//! let spec = RoleSpec::new("CTO", "Pragmatic engineering lead").with_tool("shell");
//! let role = Role::from_spec(spec, Arc::new(Echo));
//! assert_eq!(role.name(), "CTO");
//! assert!(role.memory().is_empty());
//! ```

use crate::companysim::workspace::{Workspace, WorkspaceProvisioner};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type RoleResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Serializable description of a role, as found in company definition files.
///
/// ```rust
/// use companysim::role::RoleSpec;
///
/// let spec: RoleSpec = serde_json::from_str(
///     r#"{"name": "QA", "persona": "Meticulous tester", "tools": ["browser"]}"#,
/// ).unwrap();
/// assert_eq!(spec.tools, vec!["browser".to_string()]);
///
/// // `tools` may be omitted
/// let spec: RoleSpec = serde_json::from_str(r#"{"name": "PM", "persona": "Planner"}"#).unwrap();
/// assert!(spec.tools.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    pub persona: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Read a JSON array of role descriptions from `path`.
    pub fn load_all(path: &Path) -> io::Result<Vec<RoleSpec>> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to parse role descriptions: {}", e),
            )
        })
    }
}

/// One recorded interaction result in a role's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// 1-based round in which the entry was produced.
    pub round: usize,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl MemoryEntry {
    pub fn new(round: usize, content: impl Into<String>) -> Self {
        Self {
            round,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attach metadata to the entry (builder pattern).
    ///
    /// ```rust
    /// use companysim::role::MemoryEntry;
    ///
    /// let entry = MemoryEntry::new(1, "Drafted API").with_metadata("model", "gpt-4");
    /// assert_eq!(entry.metadata.get("model").unwrap(), "gpt-4");
    /// ```
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Read-only view handed to a [`TaskPerformer`] for one unit of work.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub name: &'a str,
    pub persona: &'a str,
    pub tools: &'a [String],
    /// Everything the role has recorded so far, oldest first.
    pub memory: &'a [MemoryEntry],
    pub round: usize,
    pub complex_task: &'a str,
    /// Task the planner assigned this role for the round, if any.
    pub assignment: Option<&'a str>,
}

/// The reasoning step of a role.
///
/// Implementations return the entry to record; the [`Role`] appends it to memory
/// only when the call succeeds, so a failing unit leaves memory untouched.
#[async_trait]
pub trait TaskPerformer: Send + Sync {
    /// Tool-mode routine, with the role's private workspace.
    async fn perform_task(
        &self,
        ctx: TaskContext<'_>,
        workspace: &Workspace,
    ) -> RoleResult<MemoryEntry>;

    /// Routine used when the simulation runs without tools.
    async fn perform_task_without_tools(&self, ctx: TaskContext<'_>) -> RoleResult<MemoryEntry>;
}

/// A simulated employee with private, append-only memory.
pub struct Role {
    name: String,
    persona: String,
    tools: Vec<String>,
    memory: Vec<MemoryEntry>,
    // Workspace together with the path it was provisioned at.
    workspace: Option<(PathBuf, Workspace)>,
    performer: Arc<dyn TaskPerformer>,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        tools: Vec<String>,
        performer: Arc<dyn TaskPerformer>,
    ) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            tools,
            memory: Vec::new(),
            workspace: None,
            performer,
        }
    }

    pub fn from_spec(spec: RoleSpec, performer: Arc<dyn TaskPerformer>) -> Self {
        Self::new(spec.name, spec.persona, spec.tools, performer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn memory(&self) -> &[MemoryEntry] {
        &self.memory
    }

    pub fn last_memory(&self) -> Option<&MemoryEntry> {
        self.memory.last()
    }

    /// Workspace provisioned for this role, if it has run in tool mode.
    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref().map(|(_, workspace)| workspace)
    }

    fn context<'a>(
        &'a self,
        round: usize,
        complex_task: &'a str,
        assignment: Option<&'a str>,
    ) -> TaskContext<'a> {
        TaskContext {
            name: &self.name,
            persona: &self.persona,
            tools: &self.tools,
            memory: &self.memory,
            round,
            complex_task,
            assignment,
        }
    }

    /// Run the tool-enabled routine, provisioning the workspace at
    /// `workspace_path` on first use. The workspace is reused while the path
    /// stays the same and replaced when a later run uses a different one.
    pub async fn perform_task(
        &mut self,
        round: usize,
        complex_task: &str,
        assignment: Option<&str>,
        provisioner: &dyn WorkspaceProvisioner,
        workspace_path: &Path,
    ) -> RoleResult<()> {
        let reusable = matches!(&self.workspace, Some((path, _)) if path == workspace_path);
        if !reusable {
            let workspace = provisioner.provision(workspace_path).await?;
            self.workspace = Some((workspace_path.to_path_buf(), workspace));
        }

        let performer = Arc::clone(&self.performer);
        let entry = match self.workspace.as_ref() {
            Some((_, workspace)) => {
                performer
                    .perform_task(self.context(round, complex_task, assignment), workspace)
                    .await?
            }
            None => return Err("workspace missing after provisioning".into()),
        };

        self.memory.push(entry);
        Ok(())
    }

    /// Run the no-tool routine.
    pub async fn perform_task_without_tools(
        &mut self,
        round: usize,
        complex_task: &str,
        assignment: Option<&str>,
    ) -> RoleResult<()> {
        let performer = Arc::clone(&self.performer);
        let entry = performer
            .perform_task_without_tools(self.context(round, complex_task, assignment))
            .await?;

        self.memory.push(entry);
        Ok(())
    }
}
