//! Per-role workspaces for tool-mode execution.
//!
//! Every role that runs with tool access gets its own scratch directory at
//! `<workspace_root_dir>/<run_id>/<role name>`. Directories are created lazily the
//! first time a role needs one and reused for the rest of the run.
//!
//! A [`Workspace`] restricts file access to its root: absolute paths and paths
//! that escape the root via `..` or symlinks are rejected.
//!
//! # Example
//!
//! ```rust,no_run
//! use companysim::workspace::{FsProvisioner, WorkspaceLayout, WorkspaceProvisioner};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let layout = WorkspaceLayout::new("workspace", "20250101_120000");
//! let workspace = FsProvisioner.provision(&layout.path_for("Software Engineer")).await?;
//!
//! workspace.write_file("notes/plan.md", "# Plan").await?;
//! assert_eq!(workspace.read_file("notes/plan.md").await?, "# Plan");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Errors raised while provisioning or using a workspace.
#[derive(Debug, Clone)]
pub enum WorkspaceError {
    /// Path escapes the workspace root.
    PathTraversal(String),
    /// Absolute or otherwise malformed path.
    InvalidPath(String),
    /// Path does not exist.
    NotFound(String),
    /// A file operation was attempted on a directory.
    IsDirectory(String),
    /// Underlying filesystem failure, with context.
    Io(String),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::PathTraversal(msg) => {
                write!(f, "Path traversal attempt blocked: {}", msg)
            }
            WorkspaceError::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
            WorkspaceError::NotFound(msg) => write!(f, "File not found: {}", msg),
            WorkspaceError::IsDirectory(msg) => write!(f, "Is a directory: {}", msg),
            WorkspaceError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl Error for WorkspaceError {}

impl WorkspaceError {
    fn io(context: &str, err: io::Error) -> Self {
        WorkspaceError::Io(format!("{}: {}", context, err))
    }
}

/// Where workspaces for one run live on disk.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root_dir: PathBuf,
    run_id: String,
}

impl WorkspaceLayout {
    pub fn new(root_dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            run_id: run_id.into(),
        }
    }

    pub fn run_dir(&self) -> PathBuf {
        self.root_dir.join(&self.run_id)
    }

    /// Directory for `role_name` in this run.
    ///
    /// The role name is flattened into a single path component so two distinct
    /// roles can never share (or nest inside) each other's directory.
    ///
    /// ```rust
    /// use companysim::workspace::WorkspaceLayout;
    /// use std::path::PathBuf;
    ///
    /// let layout = WorkspaceLayout::new("ws", "run1");
    /// assert_eq!(layout.path_for("CEO"), PathBuf::from("ws/run1/CEO"));
    /// assert_eq!(layout.path_for("../QA Lead"), PathBuf::from("ws/run1/.._QA Lead"));
    /// ```
    pub fn path_for(&self, role_name: &str) -> PathBuf {
        self.run_dir().join(sanitize_component(role_name))
    }
}

fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();

    match cleaned.trim() {
        "" => "unnamed".to_string(),
        dots @ ("." | "..") => dots.replace('.', "_"),
        trimmed => trimmed.to_string(),
    }
}

/// Creates workspaces. Implementations must be idempotent per path.
#[async_trait]
pub trait WorkspaceProvisioner: Send + Sync {
    /// Create the directory at `path` if absent (reuse it otherwise) and return a
    /// workspace rooted there.
    async fn provision(&self, path: &Path) -> Result<Workspace, WorkspaceError>;
}

/// Provisioner backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvisioner;

#[async_trait]
impl WorkspaceProvisioner for FsProvisioner {
    async fn provision(&self, path: &Path) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| WorkspaceError::io(&format!("cannot create {}", path.display()), e))?;

        let root = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| WorkspaceError::io("cannot canonicalize workspace root", e))?;

        log::debug!("Workspace ready at {}", root.display());
        Ok(Workspace::new(root))
    }
}

/// A directory that confines file access for one role.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Wrap an existing directory. Prefer [`WorkspaceProvisioner::provision`],
    /// which also creates it.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` under the root, rejecting absolute paths and escapes.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, WorkspaceError> {
        let requested = Path::new(relative);
        if requested.is_absolute() {
            return Err(WorkspaceError::InvalidPath(
                "Absolute paths are not allowed".to_string(),
            ));
        }

        let mut normalized = PathBuf::new();
        for component in requested.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(WorkspaceError::PathTraversal(format!(
                            "Path escapes workspace root: {}",
                            relative
                        )));
                    }
                }
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(WorkspaceError::InvalidPath(relative.to_string()));
                }
            }
        }

        let effective = self.root.join(&normalized);
        self.ensure_within_root(&effective, relative)?;
        Ok(effective)
    }

    // Symlinks inside the workspace could still point outside, so compare the
    // canonical form of the nearest existing ancestor against the root.
    fn ensure_within_root(&self, effective: &Path, requested: &str) -> Result<(), WorkspaceError> {
        let root_canonical = self
            .root
            .canonicalize()
            .map_err(|e| WorkspaceError::io("cannot canonicalize root", e))?;

        let mut existing = effective;
        let mut suffix = Vec::new();
        while !existing.exists() {
            match (existing.file_name(), existing.parent()) {
                (Some(name), Some(parent)) => {
                    suffix.push(name.to_os_string());
                    existing = parent;
                }
                _ => {
                    return Err(WorkspaceError::InvalidPath(format!(
                        "No existing ancestor for {}",
                        requested
                    )))
                }
            }
        }

        let mut canonical = existing
            .canonicalize()
            .map_err(|e| WorkspaceError::io("cannot canonicalize path", e))?;
        for part in suffix.into_iter().rev() {
            canonical.push(part);
        }

        if canonical.starts_with(&root_canonical) {
            Ok(())
        } else {
            Err(WorkspaceError::PathTraversal(format!(
                "Path escapes workspace root: {}",
                requested
            )))
        }
    }

    pub async fn read_file(&self, relative: &str) -> Result<String, WorkspaceError> {
        let path = self.resolve(relative)?;
        if !path.exists() {
            return Err(WorkspaceError::NotFound(relative.to_string()));
        }
        if path.is_dir() {
            return Err(WorkspaceError::IsDirectory(relative.to_string()));
        }
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| WorkspaceError::io(relative, e))
    }

    /// Write (overwrite) a file, creating parent directories as needed.
    pub async fn write_file(&self, relative: &str, content: &str) -> Result<(), WorkspaceError> {
        let path = self.resolve(relative)?;
        if path.is_dir() {
            return Err(WorkspaceError::IsDirectory(relative.to_string()));
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkspaceError::io(relative, e))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| WorkspaceError::io(relative, e))
    }

    /// Names of the entries directly under `relative`, sorted.
    pub async fn list_files(&self, relative: &str) -> Result<Vec<String>, WorkspaceError> {
        let path = self.resolve(relative)?;
        if !path.is_dir() {
            return Err(WorkspaceError::NotFound(relative.to_string()));
        }

        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| WorkspaceError::io(relative, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WorkspaceError::io(relative, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
