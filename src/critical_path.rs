//! Critical path analysis over a project's dated tasks.
//!
//! The classic two-pass method: a forward pass derives each task's
//! earliest start and finish from its predecessors, a backward pass
//! derives the latest start and finish that delay nothing downstream.
//! Slack is the gap between the two; zero-slack tasks form the critical
//! path.
//!
//! Disconnected islands of the graph are measured against their own
//! finish lines, so a short island gains no slack merely because a longer
//! island exists elsewhere in the project. The reported chain is the
//! longest zero-slack path across all islands.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

use crate::dates::{days_between, duration_days};
use crate::graph::{CyclicGraphError, DependencyGraph};
use crate::models::Task;

/// Timing computed for one task, in day offsets from the result's
/// `origin`. Finish offsets are exclusive: a task starting at offset 0
/// with a 4 day duration finishes at offset 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
    /// Days the task can slip without delaying its island's finish.
    pub slack_days: i64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.slack_days == 0
    }
}

/// Result of a critical path computation.
#[derive(Clone, Debug, Default)]
pub struct CriticalPath {
    /// Reference date for the day offsets in `timings`: the earliest
    /// start among the project's dated tasks. `None` when nothing is
    /// dated.
    pub origin: Option<NaiveDate>,
    /// Ids of the longest zero-slack chain, in dependency order.
    pub tasks: Vec<String>,
    /// Combined duration of the chain members, in days.
    pub total_duration_days: i64,
    /// Timing for every dated task in the project, critical or not, so
    /// callers can surface near-critical tasks as well.
    pub timings: FxHashMap<String, TaskTiming>,
}

impl CriticalPath {
    pub fn slack_days(&self, task_id: &str) -> Option<i64> {
        self.timings.get(task_id).map(|t| t.slack_days)
    }

    pub fn is_critical(&self, task_id: &str) -> bool {
        self.timings
            .get(task_id)
            .map(TaskTiming::is_critical)
            .unwrap_or(false)
    }
}

/// Compute the critical path for a project's tasks.
///
/// Tasks missing either date are excluded entirely; edges touching them
/// are dropped with them, so a dependent of an undated task anchors at
/// its own recorded start.
///
/// # Arguments
/// * `tasks` - The project's tasks, dated or not
///
/// # Returns
/// * `Ok(CriticalPath)` with per-task timings and the longest chain
/// * `Err(CyclicGraphError)` if the stored edge set contains a cycle
pub fn critical_path(tasks: &[Task]) -> Result<CriticalPath, CyclicGraphError> {
    let dated: Vec<&Task> = tasks.iter().filter(|t| t.is_dated()).collect();
    let Some(origin) = dated.iter().filter_map(|t| t.start_date).min() else {
        return Ok(CriticalPath::default());
    };

    let by_id: FxHashMap<&str, &Task> = dated.iter().map(|t| (t.id.as_str(), *t)).collect();
    let graph = DependencyGraph::build(dated.iter().copied());
    let order = graph.topo_order()?;

    let mut timings: FxHashMap<String, TaskTiming> =
        FxHashMap::with_capacity_and_hasher(dated.len(), Default::default());

    // Forward pass: roots anchor at their recorded start, dependents at
    // the latest predecessor finish.
    for id in &order {
        let Some(task) = by_id.get(id.as_str()) else {
            continue;
        };
        let Some(dates) = task.dates() else {
            continue;
        };
        let duration = duration_days(dates.start_date, dates.due_date);

        let earliest_start = if graph.in_degree(id) == 0 {
            days_between(origin, dates.start_date)
        } else {
            graph
                .predecessors(id)
                .iter()
                .filter_map(|p| timings.get(p))
                .map(|t| t.earliest_finish)
                .max()
                .unwrap_or(0)
        };

        timings.insert(
            id.clone(),
            TaskTiming {
                earliest_start,
                earliest_finish: earliest_start + duration,
                ..TaskTiming::default()
            },
        );
    }

    // Every island finishes on its own schedule: its last earliest finish
    // is the anchor for the backward pass within it.
    let components = graph.components();
    let mut component_of: FxHashMap<&str, usize> =
        FxHashMap::with_capacity_and_hasher(dated.len(), Default::default());
    let mut finish_line = Vec::with_capacity(components.len());
    for (index, members) in components.iter().enumerate() {
        let finish = members
            .iter()
            .filter_map(|m| timings.get(m))
            .map(|t| t.earliest_finish)
            .max()
            .unwrap_or(0);
        finish_line.push(finish);
        for member in members {
            component_of.insert(member.as_str(), index);
        }
    }

    // Backward pass in reverse topological order.
    for id in order.iter().rev() {
        let from_successors = graph
            .successors(id)
            .iter()
            .filter_map(|s| timings.get(s.as_str()))
            .map(|t| t.latest_start)
            .min();
        let latest_finish = match from_successors {
            Some(finish) => finish,
            None => component_of
                .get(id.as_str())
                .map(|&index| finish_line[index])
                .unwrap_or(0),
        };

        if let Some(timing) = timings.get_mut(id) {
            let duration = timing.earliest_finish - timing.earliest_start;
            timing.latest_finish = latest_finish;
            timing.latest_start = latest_finish - duration;
            timing.slack_days = timing.latest_start - timing.earliest_start;
        }
    }

    // Pick the longest chain across islands.
    let mut best_chain: Vec<String> = Vec::new();
    let mut best_total = 0;
    for members in &components {
        let Some(chain) = component_chain(members, &graph, &timings) else {
            continue;
        };
        let total = chain_duration(&chain, &timings);
        if better_chain(&chain, total, &best_chain, best_total, &timings) {
            best_chain = chain;
            best_total = total;
        }
    }

    Ok(CriticalPath {
        origin: Some(origin),
        tasks: best_chain,
        total_duration_days: best_total,
        timings,
    })
}

/// The zero-slack chain of one island: start from the critical task that
/// finishes last and walk critical predecessors back to a root. Ties are
/// broken toward the lexically first id so results are stable.
fn component_chain(
    members: &[String],
    graph: &DependencyGraph,
    timings: &FxHashMap<String, TaskTiming>,
) -> Option<Vec<String>> {
    let sink = members
        .iter()
        .filter_map(|m| timings.get(m).map(|t| (m, t)))
        .filter(|(_, t)| t.is_critical())
        .max_by(|(id_a, a), (id_b, b)| {
            a.earliest_finish
                .cmp(&b.earliest_finish)
                .then_with(|| id_b.cmp(id_a))
        })
        .map(|(id, _)| id)?;

    let mut chain = vec![sink.clone()];
    let mut current = sink.as_str();
    loop {
        let Some(timing) = timings.get(current) else {
            break;
        };
        let pred = graph
            .predecessors(current)
            .iter()
            .filter(|p| {
                timings.get(p.as_str()).is_some_and(|t| {
                    t.is_critical() && t.earliest_finish == timing.earliest_start
                })
            })
            .min();
        match pred {
            Some(p) => {
                chain.push(p.clone());
                current = p;
            }
            None => break,
        }
    }

    chain.reverse();
    Some(chain)
}

fn chain_duration(chain: &[String], timings: &FxHashMap<String, TaskTiming>) -> i64 {
    chain
        .iter()
        .filter_map(|id| timings.get(id))
        .map(|t| t.earliest_finish - t.earliest_start)
        .sum()
}

/// Chain comparison across islands: the larger total wins, then the
/// earlier start, then the lexically first head.
fn better_chain(
    chain: &[String],
    total: i64,
    best_chain: &[String],
    best_total: i64,
    timings: &FxHashMap<String, TaskTiming>,
) -> bool {
    if best_chain.is_empty() {
        return true;
    }
    let head_start = |c: &[String]| {
        c.first()
            .and_then(|id| timings.get(id))
            .map(|t| t.earliest_start)
    };
    match total.cmp(&best_total) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match head_start(chain).cmp(&head_start(best_chain)) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => chain.first() < best_chain.first(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dependency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task(id: &str, start: (u32, u32), due: (u32, u32), deps: &[&str]) -> Task {
        let mut task = Task::new(id, "p1");
        task.start_date = Some(date(2024, start.0, start.1));
        task.due_date = Some(date(2024, due.0, due.1));
        task.dependencies = deps.iter().map(|d| Dependency::manual(*d)).collect();
        task
    }

    fn make_undated(id: &str, deps: &[&str]) -> Task {
        let mut task = Task::new(id, "p1");
        task.dependencies = deps.iter().map(|d| Dependency::manual(*d)).collect();
        task
    }

    #[test]
    fn test_single_task_is_its_own_chain() {
        let tasks = vec![make_task("a", (1, 1), (1, 5), &[])];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.origin, Some(date(2024, 1, 1)));
        assert_eq!(result.tasks, vec!["a"]);
        assert_eq!(result.total_duration_days, 4);
        assert_eq!(result.slack_days("a"), Some(0));
        assert!(result.is_critical("a"));
    }

    #[test]
    fn test_empty_project() {
        let result = critical_path(&[]).unwrap();
        assert_eq!(result.origin, None);
        assert!(result.tasks.is_empty());
        assert_eq!(result.total_duration_days, 0);
        assert!(result.timings.is_empty());
    }

    #[test]
    fn test_chain_accumulates_duration() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 3), &[]),
            make_task("b", (1, 4), (1, 8), &["a"]),
            make_task("c", (1, 9), (1, 10), &["b"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.tasks, vec!["a", "b", "c"]);
        assert_eq!(result.total_duration_days, 2 + 4 + 1);
        for id in ["a", "b", "c"] {
            assert_eq!(result.slack_days(id), Some(0));
        }
    }

    #[test]
    fn test_longer_branch_wins_shorter_gets_slack() {
        // t4 waits on both branches; t2 (4 days) outweighs t3 (2 days).
        let tasks = vec![
            make_task("t1", (1, 1), (1, 5), &[]),
            make_task("t2", (1, 6), (1, 10), &["t1"]),
            make_task("t3", (1, 6), (1, 8), &["t1"]),
            make_task("t4", (1, 11), (1, 12), &["t2", "t3"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.tasks, vec!["t1", "t2", "t4"]);
        assert_eq!(result.total_duration_days, 4 + 4 + 1);
        assert_eq!(result.slack_days("t1"), Some(0));
        assert_eq!(result.slack_days("t2"), Some(0));
        assert_eq!(result.slack_days("t4"), Some(0));
        // The short branch can slip by the duration difference.
        assert_eq!(result.slack_days("t3"), Some(2));
        assert!(!result.is_critical("t3"));
    }

    #[test]
    fn test_slack_never_negative() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 5), &[]),
            make_task("b", (1, 6), (1, 10), &["a"]),
            make_task("c", (1, 6), (1, 8), &["a"]),
            make_task("d", (1, 11), (1, 12), &["b", "c"]),
        ];
        let result = critical_path(&tasks).unwrap();

        for (id, timing) in &result.timings {
            assert!(timing.slack_days >= 0, "task {id} has negative slack");
        }
    }

    #[test]
    fn test_zero_edges_every_task_critical() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 3), &[]),
            make_task("b", (1, 1), (1, 6), &[]),
            make_task("c", (1, 2), (1, 5), &[]),
        ];
        let result = critical_path(&tasks).unwrap();

        // Each task is its own island, so none of them has slack.
        for id in ["a", "b", "c"] {
            assert_eq!(result.slack_days(id), Some(0), "task {id}");
        }
        // The longest single task is the chain.
        assert_eq!(result.tasks, vec!["b"]);
        assert_eq!(result.total_duration_days, 5);
    }

    #[test]
    fn test_disconnected_islands_measured_independently() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 3), &[]),
            make_task("b", (1, 4), (1, 10), &["a"]),
            make_task("x", (1, 1), (1, 2), &[]),
            make_task("y", (1, 3), (1, 4), &["x"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.tasks, vec!["a", "b"]);
        assert_eq!(result.total_duration_days, 2 + 6);
        // The short island still has its own finish line.
        assert_eq!(result.slack_days("x"), Some(0));
        assert_eq!(result.slack_days("y"), Some(0));
    }

    #[test]
    fn test_equal_islands_resolve_deterministically() {
        let tasks = vec![
            make_task("n", (1, 1), (1, 4), &[]),
            make_task("m", (1, 1), (1, 4), &[]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.tasks, vec!["m"]);
        assert_eq!(result.total_duration_days, 3);
    }

    #[test]
    fn test_undated_tasks_excluded() {
        let tasks = vec![
            make_undated("draft", &[]),
            make_task("a", (1, 5), (1, 8), &["draft"]),
            make_task("b", (1, 9), (1, 11), &["a"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert!(!result.timings.contains_key("draft"));
        // The edge to the undated task is dropped, so "a" anchors at its
        // own recorded start.
        assert_eq!(result.timings["a"].earliest_start, 0);
        assert_eq!(result.origin, Some(date(2024, 1, 5)));
        assert_eq!(result.tasks, vec!["a", "b"]);
    }

    #[test]
    fn test_partially_dated_task_excluded() {
        let mut partial = make_undated("partial", &[]);
        partial.start_date = Some(date(2024, 1, 1));
        let tasks = vec![partial, make_task("a", (1, 1), (1, 2), &[])];
        let result = critical_path(&tasks).unwrap();

        assert!(!result.timings.contains_key("partial"));
        assert_eq!(result.tasks, vec!["a"]);
    }

    #[test]
    fn test_late_root_carries_no_slack() {
        // Two roots feed one sink; the later root's branch is tight while
        // the early root could slip.
        let tasks = vec![
            make_task("r1", (1, 1), (1, 3), &[]),
            make_task("r2", (1, 4), (1, 6), &[]),
            make_task("sink", (1, 7), (1, 8), &["r1", "r2"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.slack_days("r1"), Some(3));
        assert_eq!(result.slack_days("r2"), Some(0));
        assert_eq!(result.tasks, vec!["r2", "sink"]);
        assert_eq!(result.total_duration_days, 2 + 1);
    }

    #[test]
    fn test_same_day_task_counts_one_day() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 1), &[]),
            make_task("b", (1, 2), (1, 3), &["a"]),
        ];
        let result = critical_path(&tasks).unwrap();

        assert_eq!(result.tasks, vec!["a", "b"]);
        assert_eq!(result.total_duration_days, 1 + 1);
        assert_eq!(result.timings["a"].earliest_finish, 1);
    }

    #[test]
    fn test_cycle_in_stored_edges_rejected() {
        let tasks = vec![
            make_task("a", (1, 1), (1, 2), &["b"]),
            make_task("b", (1, 3), (1, 4), &["a"]),
        ];
        let err = critical_path(&tasks).unwrap_err();
        assert!(err.tasks.contains(&"a".to_string()));
        assert!(err.tasks.contains(&"b".to_string()));
    }

    #[test]
    fn test_chain_total_dominates_all_paths() {
        // Every root-to-sink path in the diamond must be no longer than
        // the reported chain.
        let tasks = vec![
            make_task("a", (1, 1), (1, 5), &[]),
            make_task("b", (1, 6), (1, 10), &["a"]),
            make_task("c", (1, 6), (1, 8), &["a"]),
            make_task("d", (1, 11), (1, 12), &["b", "c"]),
        ];
        let result = critical_path(&tasks).unwrap();

        let duration = |id: &str| {
            let t = &result.timings[id];
            t.earliest_finish - t.earliest_start
        };
        let paths = [
            vec!["a", "b", "d"],
            vec!["a", "c", "d"],
            vec!["a", "b"],
            vec!["a", "c"],
        ];
        for path in &paths {
            let total: i64 = path.iter().map(|id| duration(id)).sum();
            assert!(total <= result.total_duration_days);
        }
    }
}
