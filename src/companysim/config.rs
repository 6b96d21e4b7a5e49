//! Configuration for a company simulation.
//!
//! Provides the [`SimulationConfig`] struct consumed by
//! [`Environment`](crate::environment::Environment) and
//! [`BatchScheduler`](crate::scheduler::BatchScheduler). Users construct it
//! manually or pull overrides from the process environment; no config-file
//! parsing dependencies are required.
//!
//! # Example
//!
//! ```rust
//! use companysim::SimulationConfig;
//! use std::path::PathBuf;
//!
//! let config = SimulationConfig::default()
//!     .with_max_turn(5)
//!     .with_max_concurrency(2)
//!     .with_workspace_root_dir(PathBuf::from("/tmp/company_runs"));
//!
//! assert_eq!(config.max_turn, 5);
//! assert_eq!(config.max_concurrency, 2);
//! assert!(!config.use_tool);
//! ```

use chrono::Local;
use std::env;
use std::path::PathBuf;

/// Default number of rounds before a run is cut off.
pub const DEFAULT_MAX_TURN: usize = 10;

/// Default number of role units allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Explicit configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Round ceiling. A run that never reports `finished` stops after this many rounds.
    pub max_turn: usize,

    /// Upper bound on simultaneously running role units within a batch.
    pub max_concurrency: usize,

    /// Whether roles run their tool-enabled routine (and get a workspace).
    pub use_tool: bool,

    /// Directory under which per-run, per-role workspaces are created.
    pub workspace_root_dir: PathBuf,

    /// Identifier of this run; becomes the middle component of workspace paths.
    pub run_id: String,
}

impl Default for SimulationConfig {
    /// Defaults: 10 turns, 4 concurrent units, no tools, `./workspace`, and a
    /// run id derived from the current local time.
    ///
    /// # Example
    ///
    /// ```rust
    /// use companysim::SimulationConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = SimulationConfig::default();
    /// assert_eq!(config.max_turn, 10);
    /// assert_eq!(config.max_concurrency, 4);
    /// assert_eq!(config.workspace_root_dir, PathBuf::from("workspace"));
    /// ```
    fn default() -> Self {
        Self {
            max_turn: DEFAULT_MAX_TURN,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            use_tool: false,
            workspace_root_dir: PathBuf::from("workspace"),
            run_id: timestamp_run_id(),
        }
    }
}

impl SimulationConfig {
    /// Build a config from the defaults, overridden by `MAX_TURN`, `MAX_THREADS`,
    /// `USE_TOOL` and `WORKSPACE_ROOT` when they are set and parse.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max_turn) = parse_env::<usize>("MAX_TURN") {
            config.max_turn = max_turn;
        }
        if let Some(max_threads) = parse_env::<usize>("MAX_THREADS") {
            config.max_concurrency = max_threads;
        }
        if let Some(use_tool) = parse_env::<bool>("USE_TOOL") {
            config.use_tool = use_tool;
        }
        if let Ok(root) = env::var("WORKSPACE_ROOT") {
            if !root.trim().is_empty() {
                config.workspace_root_dir = PathBuf::from(root);
            }
        }

        config
    }

    pub fn with_max_turn(mut self, max_turn: usize) -> Self {
        self.max_turn = max_turn;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_use_tool(mut self, use_tool: bool) -> Self {
        self.use_tool = use_tool;
        self
    }

    pub fn with_workspace_root_dir(mut self, dir: PathBuf) -> Self {
        self.workspace_root_dir = dir;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

/// Run identifier in the `%Y%m%d_%H%M%S` form used for workspace directories.
pub fn timestamp_run_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
