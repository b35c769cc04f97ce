//! Forward-pass date assignment for tasks missing dates.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::config::ScheduleConfig;
use crate::dates::add_days;
use crate::graph::{CyclicGraphError, DependencyGraph};
use crate::models::{Task, TaskDates};

/// A date pair computed for one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedDates {
    pub task_id: String,
    pub dates: TaskDates,
}

/// Compute dates for every task in the project missing one or both.
///
/// Tasks are walked in topological order so predecessors are dated before
/// their dependents. An eligible task starts the day after the latest due
/// date among its predecessors (existing or just computed), or on `today`
/// when it has none; it is due `default_duration_days` later. Fully dated
/// tasks are left untouched, and a task with only one date set has both
/// recomputed.
///
/// `today` is caller-supplied; the planner never reads a clock.
///
/// # Returns
/// * `Ok(Vec<PlannedDates>)` in dependency order, empty when every task
///   already has both dates
/// * `Err(CyclicGraphError)` if the stored edge set contains a cycle
pub fn plan(
    tasks: &[Task],
    today: NaiveDate,
    config: &ScheduleConfig,
) -> Result<Vec<PlannedDates>, CyclicGraphError> {
    let graph = DependencyGraph::build(tasks);
    let order = graph.topo_order()?;

    let by_id: FxHashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    // Working view of each task's due date. Seeded from tasks keeping
    // their dates; grows as the walk assigns new ones.
    let mut due_by_id: FxHashMap<&str, NaiveDate> = tasks
        .iter()
        .filter(|t| t.is_dated())
        .filter_map(|t| t.due_date.map(|due| (t.id.as_str(), due)))
        .collect();

    let mut planned = Vec::new();
    for id in &order {
        let Some(task) = by_id.get(id.as_str()) else {
            continue;
        };
        if task.is_dated() {
            continue;
        }

        let start = graph
            .predecessors(id)
            .iter()
            .filter_map(|p| due_by_id.get(p.as_str()))
            .max()
            .map(|latest_due| add_days(*latest_due, 1))
            .unwrap_or(today);
        let due = add_days(start, config.default_duration_days);

        due_by_id.insert(task.id.as_str(), due);
        planned.push(PlannedDates {
            task_id: task.id.clone(),
            dates: TaskDates::new(start, due),
        });
    }

    Ok(planned)
}
