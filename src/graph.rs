//! Dependency graph construction and traversal.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::Task;

/// The dependency graph stalled because some tasks could never be freed:
/// the stored edge set contains a cycle. `tasks` lists every task still
/// waiting on a predecessor when the traversal stopped, which always
/// includes the cycle members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicGraphError {
    pub tasks: Vec<String>,
}

impl std::fmt::Display for CyclicGraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "dependency graph contains a cycle involving tasks {:?}",
            self.tasks
        )
    }
}

impl std::error::Error for CyclicGraphError {}

/// Adjacency view of one project's dependency edges.
///
/// Every input task appears in the graph, including tasks with no edges.
/// Edges pointing at tasks outside the input set are dropped during
/// construction. Traversal order is deterministic: tasks are visited in
/// input order, edges in embedded-list order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    ids: Vec<String>,
    predecessors: FxHashMap<String, Vec<String>>,
    successors: FxHashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn build<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        let known: FxHashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

        let mut ids = Vec::with_capacity(tasks.len());
        let mut predecessors =
            FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());
        let mut successors =
            FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());

        for task in &tasks {
            ids.push(task.id.clone());
            predecessors.entry(task.id.clone()).or_insert_with(Vec::new);
            successors.entry(task.id.clone()).or_insert_with(Vec::new);
        }

        for task in &tasks {
            for dep in task.predecessor_ids() {
                if !known.contains(dep) {
                    continue;
                }
                if let Some(preds) = predecessors.get_mut(&task.id) {
                    preds.push(dep.to_string());
                }
                if let Some(succs) = successors.get_mut(dep) {
                    succs.push(task.id.clone());
                }
            }
        }

        Self {
            ids,
            predecessors,
            successors,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.predecessors.contains_key(task_id)
    }

    /// Task ids in input order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Direct predecessors of `task_id` (the tasks it depends on).
    pub fn predecessors(&self, task_id: &str) -> &[String] {
        self.predecessors
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct successors of `task_id` (the tasks that depend on it).
    pub fn successors(&self, task_id: &str) -> &[String] {
        self.successors
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of unresolved predecessors, the starting in-degree for a
    /// topological traversal.
    pub fn in_degree(&self, task_id: &str) -> usize {
        self.predecessors(task_id).len()
    }

    /// Kahn's algorithm: tasks ordered so every predecessor appears before
    /// its dependents. Fails when the edge set contains a cycle.
    pub fn topo_order(&self) -> Result<Vec<String>, CyclicGraphError> {
        let mut in_degree: FxHashMap<&str, usize> =
            FxHashMap::with_capacity_and_hasher(self.ids.len(), Default::default());
        for id in &self.ids {
            in_degree.insert(id.as_str(), self.in_degree(id));
        }

        let mut queue: VecDeque<&str> = self
            .ids
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.ids.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            for succ in self.successors(id) {
                if let Some(degree) = in_degree.get_mut(succ.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(succ);
                    }
                }
            }
        }

        // Tasks never freed are caught in a cycle (or downstream of one).
        if order.len() != self.ids.len() {
            let stuck = self
                .ids
                .iter()
                .filter(|id| in_degree[id.as_str()] > 0)
                .cloned()
                .collect();
            return Err(CyclicGraphError { tasks: stuck });
        }

        Ok(order)
    }

    /// Would inserting the edge `task_id -> depends_on` close a cycle?
    ///
    /// True when the edge is a self-reference or when `depends_on` already
    /// depends on `task_id` through any chain of existing edges.
    pub fn would_create_cycle(&self, task_id: &str, depends_on: &str) -> bool {
        if task_id == depends_on {
            return true;
        }

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(depends_on);
        queue.push_back(depends_on);

        while let Some(current) = queue.pop_front() {
            for pred in self.predecessors(current) {
                if pred == task_id {
                    return true;
                }
                if visited.insert(pred) {
                    queue.push_back(pred);
                }
            }
        }

        false
    }

    /// Connected components over the undirected view of the edge set, in
    /// first-seen task order. Isolated tasks form singleton components.
    pub fn components(&self) -> Vec<Vec<String>> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut components = Vec::new();

        for id in &self.ids {
            if seen.contains(id.as_str()) {
                continue;
            }

            let mut members = Vec::new();
            let mut queue: VecDeque<&str> = VecDeque::new();
            seen.insert(id);
            queue.push_back(id);

            while let Some(current) = queue.pop_front() {
                members.push(current.to_string());
                let neighbors = self
                    .predecessors(current)
                    .iter()
                    .chain(self.successors(current));
                for neighbor in neighbors {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }

            components.push(members);
        }

        components
    }
}
