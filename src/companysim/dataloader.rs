//! Benchmark dataset loading.
//!
//! Datasets are newline-delimited JSON files. [`loader_for`] maps a registered
//! dataset name to its [`DataLoader`]; today that is the logic-grid puzzle set,
//! registered under several aliases for the model variants it was run with.
//!
//! ```rust,no_run
//! use companysim::dataloader::loader_for;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = loader_for("logic_grid/gpt-4").ok_or("unknown dataset")?;
//! for example in loader.load(Path::new("data/logic_grid.jsonl"))? {
//!     println!("{} => {}", example.input, example.answer);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// One benchmark question and its expected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub answer: String,
}

#[derive(Debug)]
pub enum DataLoaderError {
    Io(io::Error),
    /// A line is not valid JSON or lacks a required field.
    Malformed { line: usize, reason: String },
}

impl fmt::Display for DataLoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLoaderError::Io(e) => write!(f, "IO error: {}", e),
            DataLoaderError::Malformed { line, reason } => {
                write!(f, "Malformed record on line {}: {}", line, reason)
            }
        }
    }
}

impl Error for DataLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataLoaderError::Io(e) => Some(e),
            DataLoaderError::Malformed { .. } => None,
        }
    }
}

impl From<io::Error> for DataLoaderError {
    fn from(e: io::Error) -> Self {
        DataLoaderError::Io(e)
    }
}

pub trait DataLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Example>, DataLoaderError>;
}

/// Names under which [`LogicGridLoader`] is registered.
pub const LOGIC_GRID_DATASETS: [&str; 5] = [
    "logic_grid",
    "logic_grid/gpt-4",
    "logic_grid/gpt-4-new",
    "logic_grid/gpt-4-new-2",
    "logic_grid/gpt-4-new-norole",
];

/// Look up the loader registered for `dataset`.
pub fn loader_for(dataset: &str) -> Option<Box<dyn DataLoader>> {
    if LOGIC_GRID_DATASETS.contains(&dataset) {
        Some(Box::new(LogicGridLoader))
    } else {
        None
    }
}

/// Reads `{"inputs": "...", "targets": ["..."]}` lines.
///
/// The answer is the first target. Non-string values are kept in their JSON form.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicGridLoader;

impl LogicGridLoader {
    fn parse_line(line_no: usize, line: &str) -> Result<Example, DataLoaderError> {
        let malformed = |reason: String| DataLoaderError::Malformed {
            line: line_no,
            reason,
        };

        let record: Value = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
        let input = record
            .get("inputs")
            .ok_or_else(|| malformed("missing \"inputs\"".to_string()))?;
        let answer = record
            .get("targets")
            .and_then(Value::as_array)
            .and_then(|targets| targets.first())
            .ok_or_else(|| malformed("missing \"targets[0]\"".to_string()))?;

        Ok(Example {
            input: value_text(input),
            answer: value_text(answer),
        })
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DataLoader for LogicGridLoader {
    fn load(&self, path: &Path) -> Result<Vec<Example>, DataLoaderError> {
        let reader = BufReader::new(fs::File::open(path)?);
        let mut examples = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            examples.push(Self::parse_line(index + 1, &line)?);
        }
        log::debug!("Loaded {} logic grid example(s) from {}", examples.len(), path.display());
        Ok(examples)
    }
}
