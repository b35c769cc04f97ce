//! Chart-order reordering and the position-derived dependency chain.
//!
//! `gantt_position` orders tasks vertically on the chart, independent of
//! the dependency graph. The auto-rebuild mirrors that visual order into
//! auto-flagged edges so the chart reads top to bottom as a chain, while
//! manually authored edges stay untouched. Where the two orders disagree,
//! the manual edge wins: a chain link that would contradict one is
//! dropped rather than inserted.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::Task;

/// Direction of an adjacent-swap move in the chart's vertical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// The dependency chain the chart order implies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoChain {
    /// `(task, depends_on)` links safe to insert, in chart order.
    pub pairs: Vec<(String, String)>,
    /// Links dropped because manual edges already run the other way,
    /// directly or through intermediate tasks; inserting them would make
    /// the stored edge set cyclic.
    pub conflicted: Vec<(String, String)>,
}

/// The project's dated tasks in chart order: ascending `gantt_position`,
/// ties broken by id. Undated tasks never appear on the chart.
pub fn chart_order(tasks: &[Task]) -> Vec<&Task> {
    let mut dated: Vec<&Task> = tasks.iter().filter(|t| t.is_dated()).collect();
    dated.sort_by(|a, b| {
        a.gantt_position
            .cmp(&b.gantt_position)
            .then_with(|| a.id.cmp(&b.id))
    });
    dated
}

/// The neighbor `task_id` trades positions with when moved `direction`,
/// or `None` when the task sits at that edge of the chart or is not on
/// the chart at all.
pub fn swap_neighbor<'a>(
    tasks: &'a [Task],
    task_id: &str,
    direction: MoveDirection,
) -> Option<&'a Task> {
    let ordered = chart_order(tasks);
    let index = ordered.iter().position(|t| t.id == task_id)?;
    match direction {
        MoveDirection::Up => index.checked_sub(1).map(|i| ordered[i]),
        MoveDirection::Down => ordered.get(index + 1).copied(),
    }
}

/// Derive the chain the chart order implies: each dated task depends on
/// the one directly above it. The links of one total order cannot cycle
/// among themselves, but a manually authored dependency may already run
/// the other way; such a link lands in `conflicted` instead of `pairs`,
/// keeping the edge set acyclic once the links are stored.
pub fn auto_chain(tasks: &[Task]) -> AutoChain {
    let ordered = chart_order(tasks);
    let known: FxHashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    // Standing edges the links must coexist with. The rebuild deletes
    // every auto edge up front, so only manual ones count; paths may run
    // through undated tasks, so the whole project participates.
    let mut depends_on: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for task in tasks {
        for dep in &task.dependencies {
            if !dep.auto && known.contains(dep.depends_on.as_str()) {
                depends_on
                    .entry(task.id.as_str())
                    .or_default()
                    .push(dep.depends_on.as_str());
            }
        }
    }

    let mut chain = AutoChain::default();
    for pair in ordered.windows(2) {
        let (above, below) = (pair[0], pair[1]);
        // The link reads below-depends-on-above; if above already depends
        // on below, the link would close a loop.
        if reaches(&depends_on, above.id.as_str(), below.id.as_str()) {
            chain.conflicted.push((below.id.clone(), above.id.clone()));
        } else {
            depends_on
                .entry(below.id.as_str())
                .or_default()
                .push(above.id.as_str());
            chain.pairs.push((below.id.clone(), above.id.clone()));
        }
    }
    chain
}

/// Is `to` reachable from `from` along depends-on edges?
fn reaches(depends_on: &FxHashMap<&str, Vec<&str>>, from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in depends_on.get(current).into_iter().flatten() {
            if *next == to {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dependency;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task(id: &str, position: i64) -> Task {
        let mut task = Task::new(id, "p1");
        task.start_date = Some(date(2024, 1, 1));
        task.due_date = Some(date(2024, 1, 3));
        task.gantt_position = position;
        task
    }

    fn make_undated(id: &str, position: i64) -> Task {
        let mut task = Task::new(id, "p1");
        task.gantt_position = position;
        task
    }

    fn manual_dep(mut task: Task, depends_on: &str) -> Task {
        task.dependencies.push(Dependency::manual(depends_on));
        task
    }

    #[test]
    fn test_chart_order_sorts_by_position() {
        let tasks = vec![make_task("c", 30), make_task("a", 10), make_task("b", 20)];
        let ordered: Vec<&str> = chart_order(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_chart_order_breaks_position_ties_by_id() {
        let tasks = vec![make_task("b", 10), make_task("a", 10)];
        let ordered: Vec<&str> = chart_order(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn test_chart_order_excludes_undated() {
        let tasks = vec![make_task("a", 20), make_undated("draft", 10)];
        let ordered: Vec<&str> = chart_order(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ordered, vec!["a"]);
    }

    #[test]
    fn test_swap_neighbor_up_and_down() {
        let tasks = vec![make_task("a", 10), make_task("b", 20), make_task("c", 30)];

        let up = swap_neighbor(&tasks, "b", MoveDirection::Up).unwrap();
        assert_eq!(up.id, "a");

        let down = swap_neighbor(&tasks, "b", MoveDirection::Down).unwrap();
        assert_eq!(down.id, "c");
    }

    #[test]
    fn test_swap_neighbor_at_chart_edges() {
        let tasks = vec![make_task("a", 10), make_task("b", 20)];

        assert!(swap_neighbor(&tasks, "a", MoveDirection::Up).is_none());
        assert!(swap_neighbor(&tasks, "b", MoveDirection::Down).is_none());
    }

    #[test]
    fn test_swap_neighbor_for_task_off_the_chart() {
        let tasks = vec![make_task("a", 10), make_undated("draft", 20)];

        assert!(swap_neighbor(&tasks, "draft", MoveDirection::Up).is_none());
        assert!(swap_neighbor(&tasks, "missing", MoveDirection::Down).is_none());
    }

    #[test]
    fn test_auto_chain_links_follow_chart_order() {
        let tasks = vec![make_task("c", 30), make_task("a", 10), make_task("b", 20)];
        let chain = auto_chain(&tasks);
        assert_eq!(
            chain.pairs,
            vec![
                ("b".to_string(), "a".to_string()),
                ("c".to_string(), "b".to_string()),
            ]
        );
        assert!(chain.conflicted.is_empty());
    }

    #[test]
    fn test_auto_chain_skips_undated_rows() {
        let tasks = vec![
            make_task("a", 10),
            make_undated("draft", 20),
            make_task("b", 30),
        ];
        let chain = auto_chain(&tasks);
        assert_eq!(chain.pairs, vec![("b".to_string(), "a".to_string())]);
    }

    #[test]
    fn test_single_task_has_no_links() {
        let tasks = vec![make_task("a", 10)];
        let chain = auto_chain(&tasks);
        assert!(chain.pairs.is_empty());
        assert!(chain.conflicted.is_empty());
    }

    #[test]
    fn test_auto_chain_yields_to_reverse_manual_edge() {
        // a sits above b but the user made a depend on b: linking b to a
        // would close a loop, so the manual edge wins.
        let tasks = vec![
            manual_dep(make_task("a", 10), "b"),
            make_task("b", 20),
            make_task("c", 30),
        ];
        let chain = auto_chain(&tasks);
        assert_eq!(chain.pairs, vec![("c".to_string(), "b".to_string())]);
        assert_eq!(chain.conflicted, vec![("b".to_string(), "a".to_string())]);
    }

    #[test]
    fn test_auto_chain_yields_to_transitive_manual_path() {
        // a depends on c by hand; the accepted b-to-a link extends that
        // path, so the c-to-b link would loop through it.
        let tasks = vec![
            manual_dep(make_task("a", 10), "c"),
            make_task("b", 20),
            make_task("c", 30),
        ];
        let chain = auto_chain(&tasks);
        assert_eq!(chain.pairs, vec![("b".to_string(), "a".to_string())]);
        assert_eq!(chain.conflicted, vec![("c".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_auto_chain_honors_edges_through_undated_tasks() {
        // The manual path a -> u -> b stands even though u is off the
        // chart; the b-to-a link would still close a stored loop.
        let tasks = vec![
            manual_dep(make_task("a", 10), "u"),
            make_task("b", 20),
            manual_dep(make_undated("u", 15), "b"),
        ];
        let chain = auto_chain(&tasks);
        assert!(chain.pairs.is_empty());
        assert_eq!(chain.conflicted, vec![("b".to_string(), "a".to_string())]);
    }

    #[test]
    fn test_auto_chain_keeps_link_alongside_forward_manual_edge() {
        // b already depends on a in the chain's own direction; the link
        // stays and the store's duplicate handling decides at insert.
        let tasks = vec![make_task("a", 10), manual_dep(make_task("b", 20), "a")];
        let chain = auto_chain(&tasks);
        assert_eq!(chain.pairs, vec![("b".to_string(), "a".to_string())]);
        assert!(chain.conflicted.is_empty());
    }
}
