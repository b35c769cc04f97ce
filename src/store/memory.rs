//! In-memory task and dependency tables, the reference `TaskStore`
//! implementation and test fixture.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{StoreError, TaskStore};
use crate::models::{DependencyEdge, Task, TaskDates};

#[derive(Default)]
struct Tables {
    tasks: FxHashMap<String, Task>,
    edges: Vec<DependencyEdge>,
    revisions: FxHashMap<String, u64>,
    failing_updates: FxHashSet<String>,
    failing_inserts: FxHashSet<String>,
}

impl Tables {
    fn bump_revision(&mut self, project_id: &str) {
        *self.revisions.entry(project_id.to_string()).or_insert(0) += 1;
    }

    /// A task as the engine sees it: the stored record with its
    /// predecessor list joined in from the edge table.
    fn with_dependencies(&self, task: &Task) -> Task {
        let mut task = task.clone();
        task.dependencies = self
            .edges
            .iter()
            .filter(|e| e.task_id == task.id)
            .map(DependencyEdge::as_dependency)
            .collect();
        task
    }

    fn project_of(&self, task_id: &str) -> Option<String> {
        self.tasks.get(task_id).map(|t| t.project_id.clone())
    }
}

/// In-memory tables with per-project revision stamps.
///
/// The edge table is canonical: task records are stored without embedded
/// dependencies and reads join them back in, the same shape a remote row
/// store returns. Every successful mutation bumps the owning project's
/// revision.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed or replace a task. Embedded dependencies move to the edge
    /// table; pairs already present there are kept as they are.
    pub fn insert_task(&self, task: Task) {
        let mut tables = self.lock();
        let mut record = task;
        let deps = std::mem::take(&mut record.dependencies);
        for dep in deps {
            let exists = tables
                .edges
                .iter()
                .any(|e| e.task_id == record.id && e.depends_on == dep.depends_on);
            if !exists {
                tables.edges.push(DependencyEdge {
                    task_id: record.id.clone(),
                    depends_on: dep.depends_on,
                    kind: dep.kind,
                    auto: dep.auto,
                });
            }
        }
        tables.bump_revision(&record.project_id);
        tables.tasks.insert(record.id.clone(), record);
    }

    /// Make subsequent `update_task_dates` calls for `task_id` fail with
    /// a transient error, until cleared.
    pub fn fail_updates_for(&self, task_id: &str) {
        self.lock().failing_updates.insert(task_id.to_string());
    }

    pub fn clear_update_failures(&self) {
        self.lock().failing_updates.clear();
    }

    /// Make subsequent `add_dependency` calls for edges whose dependent
    /// is `task_id` fail with a transient error, until cleared.
    pub fn fail_inserts_for(&self, task_id: &str) {
        self.lock().failing_inserts.insert(task_id.to_string());
    }

    pub fn clear_insert_failures(&self) {
        self.lock().failing_inserts.clear();
    }

    /// Snapshot of the edge table, in insertion order.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.lock().edges.clone()
    }
}

impl TaskStore for InMemoryStore {
    fn task(&self, task_id: &str) -> Result<Task, StoreError> {
        let tables = self.lock();
        let task = tables
            .tasks
            .get(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
        Ok(tables.with_dependencies(task))
    }

    fn project_tasks(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let tables = self.lock();
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .map(|t| tables.with_dependencies(t))
            .collect();
        tasks.sort_by(|a, b| {
            a.gantt_position
                .cmp(&b.gantt_position)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(tasks)
    }

    fn project_revision(&self, project_id: &str) -> Result<u64, StoreError> {
        Ok(self.lock().revisions.get(project_id).copied().unwrap_or(0))
    }

    fn update_task_dates(&self, task_id: &str, dates: TaskDates) -> Result<Task, StoreError> {
        let mut tables = self.lock();
        if tables.failing_updates.contains(task_id) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for {task_id}"
            )));
        }

        let updated = {
            let Some(task) = tables.tasks.get_mut(task_id) else {
                return Err(StoreError::TaskNotFound(task_id.to_string()));
            };
            task.start_date = Some(dates.start_date);
            task.due_date = Some(dates.due_date);
            task.clone()
        };
        tables.bump_revision(&updated.project_id);
        Ok(tables.with_dependencies(&updated))
    }

    fn swap_gantt_positions(&self, first_id: &str, second_id: &str) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let first_pos = tables
            .tasks
            .get(first_id)
            .map(|t| t.gantt_position)
            .ok_or_else(|| StoreError::TaskNotFound(first_id.to_string()))?;
        let second_pos = tables
            .tasks
            .get(second_id)
            .map(|t| t.gantt_position)
            .ok_or_else(|| StoreError::TaskNotFound(second_id.to_string()))?;

        let mut projects = Vec::new();
        if let Some(task) = tables.tasks.get_mut(first_id) {
            task.gantt_position = second_pos;
            projects.push(task.project_id.clone());
        }
        if let Some(task) = tables.tasks.get_mut(second_id) {
            task.gantt_position = first_pos;
            if !projects.contains(&task.project_id) {
                projects.push(task.project_id.clone());
            }
        }
        for project in &projects {
            tables.bump_revision(project);
        }
        Ok(())
    }

    fn add_dependency(&self, edge: DependencyEdge) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if tables.failing_inserts.contains(&edge.task_id) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for {}",
                edge.task_id
            )));
        }
        for id in [edge.task_id.as_str(), edge.depends_on.as_str()] {
            if !tables.tasks.contains_key(id) {
                return Err(StoreError::TaskNotFound(id.to_string()));
            }
        }
        let duplicate = tables
            .edges
            .iter()
            .any(|e| e.task_id == edge.task_id && e.depends_on == edge.depends_on);
        if duplicate {
            return Err(StoreError::DuplicateDependency {
                task_id: edge.task_id.clone(),
                depends_on: edge.depends_on.clone(),
            });
        }

        let mut projects = Vec::new();
        for id in [edge.task_id.as_str(), edge.depends_on.as_str()] {
            if let Some(project) = tables.project_of(id) {
                if !projects.contains(&project) {
                    projects.push(project);
                }
            }
        }
        tables.edges.push(edge);
        for project in &projects {
            tables.bump_revision(project);
        }
        Ok(())
    }

    fn dependencies(&self, task_id: &str) -> Result<Vec<DependencyEdge>, StoreError> {
        Ok(self
            .lock()
            .edges
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect())
    }

    fn remove_auto_dependencies(&self, project_id: &str) -> Result<usize, StoreError> {
        let mut tables = self.lock();
        let members: FxHashSet<String> = tables
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id.clone())
            .collect();

        let before = tables.edges.len();
        tables
            .edges
            .retain(|e| !(e.auto && (members.contains(&e.task_id) || members.contains(&e.depends_on))));
        let removed = before - tables.edges.len();
        if removed > 0 {
            tables.bump_revision(project_id);
        }
        Ok(removed)
    }
}
