//! Engine facade tying the scheduling algorithms to a task store.
//!
//! Every public operation follows the same shape: read the project's
//! revision stamp and task snapshot, compute over the snapshot, re-check
//! the stamp, then write. A revision that moved underneath the operation
//! aborts it with [`EngineError::RevisionConflict`] before the first
//! write; the caller re-reads and retries.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auto_schedule;
use crate::config::ScheduleConfig;
use crate::critical_path::{self, CriticalPath};
use crate::graph::CyclicGraphError;
use crate::models::{DependencyEdge, Task, TaskDates};
use crate::reorder::{self, MoveDirection};
use crate::store::{StoreError, TaskStore};
use crate::validate::{self, ValidationError};

/// Errors surfaced by engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A proposed manual edge was rejected by the cycle check. Nothing
    /// was written.
    #[error("dependency {task_id} -> {depends_on} would create a cycle")]
    CircularDependency {
        task_id: String,
        depends_on: String,
    },
    /// The stored edge set already contains a cycle. Computations cannot
    /// proceed on such a graph.
    #[error("dependency graph contains a cycle involving tasks {tasks:?}")]
    CyclicGraph { tasks: Vec<String> },
    #[error("due date {due} precedes start date {start}")]
    InvalidDateRange { start: NaiveDate, due: NaiveDate },
    #[error("dependency {task_id} -> {depends_on} already exists")]
    DuplicateDependency {
        task_id: String,
        depends_on: String,
    },
    #[error("tasks {task_id} and {depends_on} do not belong to the same project")]
    CrossProjectDependency {
        task_id: String,
        depends_on: String,
    },
    /// The project changed between the snapshot read and the write-back.
    /// Re-read and retry.
    #[error("project {project_id} changed mid-operation (revision {expected} became {actual})")]
    RevisionConflict {
        project_id: String,
        expected: u64,
        actual: u64,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CyclicGraphError> for EngineError {
    fn from(err: CyclicGraphError) -> Self {
        EngineError::CyclicGraph { tasks: err.tasks }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::CircularDependency {
                task_id,
                depends_on,
            } => EngineError::CircularDependency {
                task_id,
                depends_on,
            },
            ValidationError::CrossProjectDependency {
                task_id,
                depends_on,
            } => EngineError::CrossProjectDependency {
                task_id,
                depends_on,
            },
            ValidationError::InvalidDateRange { start, due } => {
                EngineError::InvalidDateRange { start, due }
            }
        }
    }
}

/// A date write that failed during a batch. Carries the planned dates so
/// the caller can retry this one task without re-running the batch.
#[derive(Clone, Debug)]
pub struct FailedUpdate {
    pub task_id: String,
    pub dates: TaskDates,
    pub error: StoreError,
}

/// Outcome of one auto-schedule run. Failures are per task; the rest of
/// the batch still went through.
#[derive(Clone, Debug, Default)]
pub struct AutoScheduleOutcome {
    /// Tasks whose dates were written, as returned by the store.
    pub updated: Vec<Task>,
    pub failed: Vec<FailedUpdate>,
}

impl AutoScheduleOutcome {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

/// An edge write that failed during a rebuild. Carries the pair so the
/// caller can retry this one link without re-running the rebuild.
#[derive(Clone, Debug)]
pub struct FailedInsert {
    pub task_id: String,
    pub depends_on: String,
    pub error: StoreError,
}

/// Outcome of an auto-dependency rebuild. Failures are per link; the
/// rest of the chain still went through.
#[derive(Clone, Debug, Default)]
pub struct RebuildOutcome {
    /// Stale auto edges deleted.
    pub removed: usize,
    /// Chain edges inserted.
    pub inserted: usize,
    /// Links yielded to a manual edge: the pair was already covered, or
    /// a manual dependency runs the other way.
    pub skipped: usize,
    pub failed: Vec<FailedInsert>,
}

/// The scheduling engine over an injected task store.
///
/// The engine owns no tasks and no clock: state lives behind the store,
/// and "today" is a parameter wherever it matters.
pub struct GanttEngine<S> {
    store: S,
    config: ScheduleConfig,
}

impl<S: TaskStore> GanttEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ScheduleConfig::default())
    }

    pub fn with_config(store: S, config: ScheduleConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Compute the critical path over the project's dated tasks.
    pub fn critical_path(&self, project_id: &str) -> Result<CriticalPath, EngineError> {
        let tasks = self.store.project_tasks(project_id)?;
        let result = critical_path::critical_path(&tasks)?;
        debug!(
            project_id,
            chain = result.tasks.len(),
            total_days = result.total_duration_days,
            "critical path computed"
        );
        Ok(result)
    }

    /// Assign dates to every task in the project missing one or both,
    /// honoring dependency order. `today` anchors tasks with no dated
    /// predecessor.
    ///
    /// Write failures are isolated per task: the batch continues and the
    /// outcome reports each failure alongside its planned dates, so a
    /// single task can be retried on its own.
    pub fn auto_schedule(
        &self,
        project_id: &str,
        today: NaiveDate,
    ) -> Result<AutoScheduleOutcome, EngineError> {
        let revision = self.store.project_revision(project_id)?;
        let tasks = self.store.project_tasks(project_id)?;
        let planned = auto_schedule::plan(&tasks, today, &self.config)?;
        if planned.is_empty() {
            debug!(project_id, "auto-schedule found nothing to date");
            return Ok(AutoScheduleOutcome::default());
        }

        self.ensure_unchanged(project_id, revision)?;

        let mut outcome = AutoScheduleOutcome::default();
        for update in planned {
            match self.store.update_task_dates(&update.task_id, update.dates) {
                Ok(task) => outcome.updated.push(task),
                Err(error) => {
                    warn!(task_id = %update.task_id, %error, "date write failed; batch continues");
                    outcome.failed.push(FailedUpdate {
                        task_id: update.task_id,
                        dates: update.dates,
                        error,
                    });
                }
            }
        }
        debug!(
            project_id,
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "auto-schedule finished"
        );
        Ok(outcome)
    }

    /// Add a manual dependency edge after checking it keeps the project's
    /// graph acyclic. A rejected edge leaves the store untouched.
    pub fn add_dependency(&self, task_id: &str, depends_on: &str) -> Result<(), EngineError> {
        let task = self.store.task(task_id)?;
        let revision = self.store.project_revision(&task.project_id)?;

        let existing = self.store.dependencies(task_id)?;
        if existing.iter().any(|e| e.depends_on == depends_on) {
            return Err(EngineError::DuplicateDependency {
                task_id: task_id.to_string(),
                depends_on: depends_on.to_string(),
            });
        }

        let tasks = self.store.project_tasks(&task.project_id)?;
        validate::check_new_dependency(&tasks, task_id, depends_on)?;

        self.ensure_unchanged(&task.project_id, revision)?;
        match self
            .store
            .add_dependency(DependencyEdge::manual(task_id, depends_on))
        {
            Ok(()) => {
                debug!(task_id, depends_on, "manual dependency added");
                Ok(())
            }
            Err(StoreError::DuplicateDependency {
                task_id,
                depends_on,
            }) => Err(EngineError::DuplicateDependency {
                task_id,
                depends_on,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a task's date pair, rejecting inverted ranges before
    /// anything reaches the store.
    pub fn set_task_dates(&self, task_id: &str, dates: TaskDates) -> Result<Task, EngineError> {
        validate::check_date_range(dates)?;
        let task = self.store.update_task_dates(task_id, dates)?;
        debug!(task_id, "task dates written");
        Ok(task)
    }

    /// Swap `task_id` with its chart neighbor in `direction` as one
    /// atomic position exchange. Returns `false`, writing nothing, when
    /// the task already sits at that edge of the chart.
    ///
    /// Arbitrary moves are sequences of adjacent swaps; callers usually
    /// follow up with [`Self::rebuild_auto_dependencies`].
    pub fn swap_adjacent(
        &self,
        project_id: &str,
        task_id: &str,
        direction: MoveDirection,
    ) -> Result<bool, EngineError> {
        let revision = self.store.project_revision(project_id)?;
        let tasks = self.store.project_tasks(project_id)?;
        if !tasks.iter().any(|t| t.id == task_id) {
            return Err(EngineError::Store(StoreError::TaskNotFound(
                task_id.to_string(),
            )));
        }

        let Some(neighbor) = reorder::swap_neighbor(&tasks, task_id, direction) else {
            debug!(project_id, task_id, "no chart neighbor to swap with");
            return Ok(false);
        };
        let neighbor_id = neighbor.id.clone();

        self.ensure_unchanged(project_id, revision)?;
        self.store.swap_gantt_positions(task_id, &neighbor_id)?;
        debug!(project_id, task_id, neighbor = %neighbor_id, "chart positions swapped");
        Ok(true)
    }

    /// Rebuild the auto-dependency chain from the current chart order:
    /// drop every auto edge touching the project, then link each dated
    /// task to the one above it. A link yields to manual edges, both when
    /// one already covers the pair and when one runs the other way so the
    /// link would close a cycle. Manual edges are never deleted or
    /// altered.
    ///
    /// Write failures are isolated per link: the loop continues and the
    /// outcome carries each failed pair, so a single link can be retried
    /// on its own. Rebuilding twice over an unchanged order lands on the
    /// same edge set.
    pub fn rebuild_auto_dependencies(
        &self,
        project_id: &str,
    ) -> Result<RebuildOutcome, EngineError> {
        let revision = self.store.project_revision(project_id)?;
        let tasks = self.store.project_tasks(project_id)?;
        let chain = reorder::auto_chain(&tasks);

        self.ensure_unchanged(project_id, revision)?;

        let removed = self.store.remove_auto_dependencies(project_id)?;
        let mut outcome = RebuildOutcome {
            removed,
            skipped: chain.conflicted.len(),
            ..RebuildOutcome::default()
        };
        for (task_id, depends_on) in chain.pairs {
            match self
                .store
                .add_dependency(DependencyEdge::auto(&task_id, &depends_on))
            {
                Ok(()) => outcome.inserted += 1,
                Err(StoreError::DuplicateDependency { .. }) => outcome.skipped += 1,
                Err(error) => {
                    warn!(
                        task_id = %task_id,
                        depends_on = %depends_on,
                        %error,
                        "edge write failed; rebuild continues"
                    );
                    outcome.failed.push(FailedInsert {
                        task_id,
                        depends_on,
                        error,
                    });
                }
            }
        }
        debug!(
            project_id,
            removed = outcome.removed,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            failed = outcome.failed.len(),
            "auto-dependency chain rebuilt"
        );
        Ok(outcome)
    }

    fn ensure_unchanged(&self, project_id: &str, expected: u64) -> Result<(), EngineError> {
        let actual = self.store.project_revision(project_id)?;
        if actual != expected {
            return Err(EngineError::RevisionConflict {
                project_id: project_id.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
