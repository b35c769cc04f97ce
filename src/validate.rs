//! Validation of date ranges and proposed dependency edges.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::graph::DependencyGraph;
use crate::models::{Task, TaskDates};

/// A proposed change was rejected before any write happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The edge `task_id -> depends_on` would close a dependency cycle
    /// (including the degenerate self-reference).
    CircularDependency {
        task_id: String,
        depends_on: String,
    },
    /// The two tasks belong to different projects, or one of them is not
    /// in the project's task set at all.
    CrossProjectDependency {
        task_id: String,
        depends_on: String,
    },
    /// The due date precedes the start date.
    InvalidDateRange { start: NaiveDate, due: NaiveDate },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::CircularDependency {
                task_id,
                depends_on,
            } => {
                write!(
                    f,
                    "dependency {task_id} -> {depends_on} would create a cycle"
                )
            }
            ValidationError::CrossProjectDependency {
                task_id,
                depends_on,
            } => {
                write!(
                    f,
                    "tasks {task_id} and {depends_on} do not belong to the same project"
                )
            }
            ValidationError::InvalidDateRange { start, due } => {
                write!(f, "due date {due} precedes start date {start}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reject date pairs where the due date precedes the start date. Equal
/// dates are allowed; a same-day task is valid.
pub fn check_date_range(dates: TaskDates) -> Result<(), ValidationError> {
    if dates.due_date < dates.start_date {
        return Err(ValidationError::InvalidDateRange {
            start: dates.start_date,
            due: dates.due_date,
        });
    }
    Ok(())
}

/// Check whether the edge `task_id -> depends_on` may be added to the
/// project whose tasks are given.
///
/// Rejections, in order: an endpoint outside the project's task set, a
/// self-reference, and an edge that would close a cycle through the
/// existing graph. The check never mutates anything; a rejected edge
/// leaves the graph exactly as it was.
pub fn check_new_dependency(
    tasks: &[Task],
    task_id: &str,
    depends_on: &str,
) -> Result<(), ValidationError> {
    let by_id: FxHashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    let (Some(task), Some(dep_task)) = (by_id.get(task_id), by_id.get(depends_on)) else {
        return Err(ValidationError::CrossProjectDependency {
            task_id: task_id.to_string(),
            depends_on: depends_on.to_string(),
        });
    };
    if task.project_id != dep_task.project_id {
        return Err(ValidationError::CrossProjectDependency {
            task_id: task_id.to_string(),
            depends_on: depends_on.to_string(),
        });
    }

    if task_id == depends_on {
        return Err(ValidationError::CircularDependency {
            task_id: task_id.to_string(),
            depends_on: depends_on.to_string(),
        });
    }

    let graph = DependencyGraph::build(tasks);
    if graph.would_create_cycle(task_id, depends_on) {
        return Err(ValidationError::CircularDependency {
            task_id: task_id.to_string(),
            depends_on: depends_on.to_string(),
        });
    }

    Ok(())
}
