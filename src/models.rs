//! Core data types for the scheduling engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::duration_days;

/// Kind of a dependency edge. Only finish-to-start links are supported:
/// the dependent task may not begin until its predecessor finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    #[default]
    FinishToStart,
}

/// A predecessor link embedded in a task record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Task that must finish before the owning task may start.
    #[serde(rename = "depends_on_task_id")]
    pub depends_on: String,
    #[serde(rename = "dependency_type", default)]
    pub kind: DependencyKind,
    /// True when the edge was generated from chart order rather than
    /// created by hand. Auto edges are rebuilt wholesale; manual edges
    /// are never touched by the rebuild.
    #[serde(rename = "is_auto", default)]
    pub auto: bool,
}

impl Dependency {
    pub fn manual(depends_on: impl Into<String>) -> Self {
        Self {
            depends_on: depends_on.into(),
            kind: DependencyKind::FinishToStart,
            auto: false,
        }
    }

    pub fn auto(depends_on: impl Into<String>) -> Self {
        Self {
            depends_on: depends_on.into(),
            kind: DependencyKind::FinishToStart,
            auto: true,
        }
    }
}

/// A dependency edge as stored: the dependent task plus its predecessor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub task_id: String,
    #[serde(rename = "depends_on_task_id")]
    pub depends_on: String,
    #[serde(rename = "dependency_type", default)]
    pub kind: DependencyKind,
    #[serde(rename = "is_auto", default)]
    pub auto: bool,
}

impl DependencyEdge {
    pub fn manual(task_id: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            depends_on: depends_on.into(),
            kind: DependencyKind::FinishToStart,
            auto: false,
        }
    }

    pub fn auto(task_id: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            depends_on: depends_on.into(),
            kind: DependencyKind::FinishToStart,
            auto: true,
        }
    }

    /// The embedded form of this edge, as carried on the dependent task.
    pub fn as_dependency(&self) -> Dependency {
        Dependency {
            depends_on: self.depends_on.clone(),
            kind: self.kind,
            auto: self.auto,
        }
    }
}

/// A start/due date pair. Dates are whole days; `due_date` is inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDates {
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl TaskDates {
    pub fn new(start_date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            start_date,
            due_date,
        }
    }
}

/// A task to be charted and scheduled.
///
/// Tasks carry two independent orderings: `gantt_position` fixes the
/// vertical slot on the chart, while `dependencies` defines the graph the
/// schedule math runs over. The two are only loosely coupled; the
/// auto-dependency rebuild derives edges from chart order on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub gantt_position: i64,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Task {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            start_date: None,
            due_date: None,
            gantt_position: 0,
            dependencies: Vec::new(),
        }
    }

    /// True when both dates are set. Only dated tasks appear on the chart
    /// and participate in critical path analysis.
    pub fn is_dated(&self) -> bool {
        self.start_date.is_some() && self.due_date.is_some()
    }

    pub fn dates(&self) -> Option<TaskDates> {
        match (self.start_date, self.due_date) {
            (Some(start), Some(due)) => Some(TaskDates::new(start, due)),
            _ => None,
        }
    }

    /// Duration in days, or `None` when either date is missing.
    pub fn duration(&self) -> Option<i64> {
        self.dates().map(|d| duration_days(d.start_date, d.due_date))
    }

    /// Ids of the tasks this task directly depends on.
    pub fn predecessor_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.depends_on.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_decodes_wire_fields() {
        let json = r#"{
            "id": "t1",
            "project_id": "p1",
            "start_date": "2024-01-01",
            "due_date": "2024-01-05",
            "gantt_position": 2,
            "dependencies": [
                {"depends_on_task_id": "t0", "dependency_type": "finish_to_start", "is_auto": true}
            ]
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.project_id, "p1");
        assert_eq!(task.start_date, Some(date(2024, 1, 1)));
        assert_eq!(task.due_date, Some(date(2024, 1, 5)));
        assert_eq!(task.gantt_position, 2);
        assert_eq!(task.dependencies.len(), 1);
        assert_eq!(task.dependencies[0].depends_on, "t0");
        assert_eq!(task.dependencies[0].kind, DependencyKind::FinishToStart);
        assert!(task.dependencies[0].auto);
    }

    #[test]
    fn test_dependency_fields_default() {
        let dep: Dependency = serde_json::from_str(r#"{"depends_on_task_id": "t0"}"#).unwrap();
        assert_eq!(dep.kind, DependencyKind::FinishToStart);
        assert!(!dep.auto);
    }

    #[test]
    fn test_undated_task_decodes() {
        let task: Task = serde_json::from_str(r#"{"id": "t1", "project_id": "p1"}"#).unwrap();
        assert!(!task.is_dated());
        assert_eq!(task.gantt_position, 0);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_is_dated_requires_both_dates() {
        let mut task = Task::new("t1", "p1");
        assert!(!task.is_dated());

        task.start_date = Some(date(2024, 1, 1));
        assert!(!task.is_dated());
        assert!(task.dates().is_none());

        task.due_date = Some(date(2024, 1, 5));
        assert!(task.is_dated());
        assert_eq!(
            task.dates(),
            Some(TaskDates::new(date(2024, 1, 1), date(2024, 1, 5)))
        );
    }

    #[test]
    fn test_duration_spans_inclusive_days() {
        let mut task = Task::new("t1", "p1");
        task.start_date = Some(date(2024, 1, 1));
        task.due_date = Some(date(2024, 1, 5));
        assert_eq!(task.duration(), Some(4));
    }

    #[test]
    fn test_same_day_task_has_minimum_duration() {
        let mut task = Task::new("t1", "p1");
        task.start_date = Some(date(2024, 3, 10));
        task.due_date = Some(date(2024, 3, 10));
        assert_eq!(task.duration(), Some(1));
    }

    #[test]
    fn test_edge_converts_to_embedded_dependency() {
        let edge = DependencyEdge::auto("t2", "t1");
        let dep = edge.as_dependency();
        assert_eq!(dep.depends_on, "t1");
        assert!(dep.auto);

        let manual = DependencyEdge::manual("t2", "t1");
        assert!(!manual.auto);
        assert_eq!(manual.kind, DependencyKind::FinishToStart);
    }
}
