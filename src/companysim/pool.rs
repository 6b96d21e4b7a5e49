//! The set of roles taking part in a simulation.
//!
//! Membership is fixed when the pool is built. Each role sits behind its own
//! `tokio::sync::Mutex`, so the one unit of work running a role in a batch holds
//! it exclusively and a failed or panicking unit never removes it from the pool.

use crate::companysim::role::{MemoryEntry, Role};
use crate::companysim::scheduler::SchedulerError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to a pooled role.
pub type SharedRole = Arc<Mutex<Role>>;

/// Insertion-ordered collection of roles, unique by name.
///
/// # Example
///
/// ```rust,no_run
/// # use companysim::role::{Role, TaskPerformer};
/// # use std::sync::Arc;
/// # async fn demo(performer: Arc<dyn TaskPerformer>) -> Result<(), Box<dyn std::error::Error>> {
/// use companysim::pool::RolePool;
///
/// let pool = RolePool::new(vec![
///     Role::new("CEO", "Visionary", vec![], Arc::clone(&performer)),
///     Role::new("CTO", "Builder", vec!["shell".into()], performer),
/// ])?;
///
/// assert_eq!(pool.names(), ["CEO", "CTO"]);
/// let ceo = pool.get("CEO").unwrap();
/// assert!(ceo.lock().await.memory().is_empty());
/// # Ok(())
/// # }
/// ```
pub struct RolePool {
    roles: Vec<SharedRole>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl RolePool {
    /// Build a pool, rejecting duplicate role names.
    pub fn new(roles: Vec<Role>) -> Result<Self, SchedulerError> {
        let mut pool = Self {
            roles: Vec::with_capacity(roles.len()),
            names: Vec::with_capacity(roles.len()),
            index: HashMap::new(),
        };

        for role in roles {
            let name = role.name().to_string();
            if pool.index.contains_key(&name) {
                return Err(SchedulerError::DuplicateRole(name));
            }
            pool.index.insert(name.clone(), pool.roles.len());
            pool.names.push(name);
            pool.roles.push(Arc::new(Mutex::new(role)));
        }

        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Role names in scheduling order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&SharedRole> {
        self.index.get(name).map(|&i| &self.roles[i])
    }

    /// Roles in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedRole)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.roles.iter())
    }

    /// Copy of every role's memory, keyed by role name.
    ///
    /// Waits for each role's lock in turn, so call it between batches.
    pub async fn memories(&self) -> BTreeMap<String, Vec<MemoryEntry>> {
        let mut out = BTreeMap::new();
        for (name, role) in self.iter() {
            out.insert(name.to_string(), role.lock().await.memory().to_vec());
        }
        out
    }
}
