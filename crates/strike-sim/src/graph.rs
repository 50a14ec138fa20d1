//! System registration and dependency-DAG scheduling.
//!
//! Systems are grouped into **stages** by levelized topological sort
//! (Kahn's algorithm): stage `k` holds every system whose prerequisites all
//! sit in stages `< k`. Systems within a stage may run in parallel; the
//! engine separates stages with a job-pool barrier.
//!
//! The parallelism contract lives on the edges: any writer-then-reader or
//! writer-writer relation between two systems on a component kind must be
//! declared with [`SystemGraph::add_dependency`], otherwise their relative
//! order within a stage is unspecified.

use std::sync::Arc;

use thiserror::Error;

use strike_ecs::Registry;

/// Index of a registered system within its graph.
pub type SystemId = usize;

/// A unit of per-tick behavior operating over the shared registry.
///
/// Systems are stateless with respect to each other; inter-tick state lives
/// in components or in the system's own fields (behind a `Mutex` — each
/// system runs as a single job per tick, so the lock is uncontended).
pub trait System: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one tick over the registry. Implementations acquire the pool
    /// guards they need in the canonical component order and must not call
    /// `Registry::destroy` while holding guards.
    fn update(&self, registry: &Registry, dt: f64);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("dependency references unregistered system id {0}")]
    UnknownSystem(SystemId),

    #[error("cycle detected in system dependencies involving {names:?}")]
    CycleDetected { names: Vec<&'static str> },
}

/// Owns the systems and their prerequisite edges, and produces the staged
/// execution plan.
#[derive(Default)]
pub struct SystemGraph {
    systems: Vec<Arc<dyn System>>,
    /// `dependents[p]` lists systems that must run after system `p`.
    dependents: Vec<Vec<SystemId>>,
    in_degree: Vec<usize>,
}

impl SystemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system; the returned id names it in dependency edges.
    pub fn add_system(&mut self, system: Arc<dyn System>) -> SystemId {
        let id = self.systems.len();
        self.systems.push(system);
        self.dependents.push(Vec::new());
        self.in_degree.push(0);
        id
    }

    /// Declares that `dependent` must not start until `prerequisite` has
    /// finished.
    pub fn add_dependency(
        &mut self,
        dependent: SystemId,
        prerequisite: SystemId,
    ) -> Result<(), GraphError> {
        let count = self.systems.len();
        for id in [dependent, prerequisite] {
            if id >= count {
                return Err(GraphError::UnknownSystem(id));
            }
        }
        self.dependents[prerequisite].push(dependent);
        self.in_degree[dependent] += 1;
        Ok(())
    }

    pub fn system(&self, id: SystemId) -> &Arc<dyn System> {
        &self.systems[id]
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Levelized topological sort of the dependency DAG.
    ///
    /// Stage ids are sorted for determinism; within a stage execution order
    /// is unspecified by contract. Fails with [`GraphError::CycleDetected`]
    /// when the edges do not form a DAG.
    pub fn execution_order(&self) -> Result<Vec<Vec<SystemId>>, GraphError> {
        let mut in_degree = self.in_degree.clone();
        let mut stages = Vec::new();
        let mut emitted = 0;

        let mut current: Vec<SystemId> = (0..self.systems.len())
            .filter(|&id| in_degree[id] == 0)
            .collect();

        while !current.is_empty() {
            current.sort_unstable();
            emitted += current.len();

            let mut next = Vec::new();
            for &id in &current {
                for &dependent in &self.dependents[id] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            stages.push(std::mem::replace(&mut current, next));
        }

        if emitted != self.systems.len() {
            let names = (0..self.systems.len())
                .filter(|&id| in_degree[id] > 0)
                .map(|id| self.systems[id].name())
                .collect();
            return Err(GraphError::CycleDetected { names });
        }

        Ok(stages)
    }
}
