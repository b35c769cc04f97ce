//! Gantt scheduling engine: dependency graphs, critical path analysis,
//! and schedule propagation for project task sets.
//!
//! The engine is a pure computation layer over tasks fetched from and
//! written back to an injected [`store::TaskStore`]; it owns no clock and
//! no entities of its own. [`engine::GanttEngine`] is the entry point for
//! the read-compute-write operations, while the algorithm modules
//! ([`graph`], [`critical_path`], [`auto_schedule`], [`reorder`],
//! [`validate`]) are plain functions over task slices and usable on
//! their own.

pub mod auto_schedule;
mod config;
pub mod critical_path;
pub mod dates;
pub mod engine;
pub mod graph;
mod models;
pub mod reorder;
pub mod store;
pub mod validate;

pub use auto_schedule::PlannedDates;
pub use config::ScheduleConfig;
pub use critical_path::{CriticalPath, TaskTiming};
pub use engine::{
    AutoScheduleOutcome, EngineError, FailedInsert, FailedUpdate, GanttEngine, RebuildOutcome,
};
pub use graph::{CyclicGraphError, DependencyGraph};
pub use models::{Dependency, DependencyEdge, DependencyKind, Task, TaskDates};
pub use reorder::{AutoChain, MoveDirection};
pub use store::memory::InMemoryStore;
pub use store::{StoreError, TaskStore};
pub use validate::ValidationError;
