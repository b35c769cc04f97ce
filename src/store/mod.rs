//! Data-access boundary between the engine and the surrounding
//! application.

pub mod memory;

use thiserror::Error;

use crate::models::{DependencyEdge, Task, TaskDates};

/// Errors surfaced by [`TaskStore`] implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("dependency {task_id} -> {depends_on} already exists")]
    DuplicateDependency {
        task_id: String,
        depends_on: String,
    },
    /// Transient failure at the boundary (network, timeout). The engine
    /// never retries these itself; retry policy belongs to the store.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations the engine needs. Implementations may wrap a remote
/// table service, a database, or the in-memory tables used in tests
/// ([`memory::InMemoryStore`]).
///
/// Reads return current state; the engine carries no cache of its own.
pub trait TaskStore: Send + Sync {
    /// Fetch a single task with its embedded predecessor list.
    fn task(&self, task_id: &str) -> Result<Task, StoreError>;

    /// All tasks of one project, each with its embedded predecessor list,
    /// in chart order (`gantt_position`, then id).
    fn project_tasks(&self, project_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Revision stamp for a project: changes whenever any of the
    /// project's tasks or dependency edges change. Unknown projects
    /// report revision 0.
    fn project_revision(&self, project_id: &str) -> Result<u64, StoreError>;

    /// Write a task's date pair and return the updated record. Must be
    /// idempotent: re-writing the same dates is not an error.
    fn update_task_dates(&self, task_id: &str, dates: TaskDates) -> Result<Task, StoreError>;

    /// Swap the `gantt_position` values of two tasks as one atomic
    /// update.
    fn swap_gantt_positions(&self, first_id: &str, second_id: &str) -> Result<(), StoreError>;

    /// Insert a dependency edge. Fails with
    /// [`StoreError::DuplicateDependency`] when the ordered pair already
    /// exists, auto or manual.
    fn add_dependency(&self, edge: DependencyEdge) -> Result<(), StoreError>;

    /// Edges whose dependent is `task_id`.
    fn dependencies(&self, task_id: &str) -> Result<Vec<DependencyEdge>, StoreError>;

    /// Delete every auto-flagged edge touching the project's tasks on
    /// either side. Returns the number removed. Manual edges are never
    /// deleted here.
    fn remove_auto_dependencies(&self, project_id: &str) -> Result<usize, StoreError>;
}
