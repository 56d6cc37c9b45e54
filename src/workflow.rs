/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! # Workflow Graph Assembly
//!
//! This module provides the core functionality for assembling workflow
//! graphs: a directed acyclic graph of [`TaskDescriptor`]s with explicit
//! ordering edges, validation, and content-based fingerprinting.
//!
//! ## Core Components
//!
//! - `Workflow`: a named task graph plus its metadata
//! - `WorkflowMetadata`: cadence, start date, retries, tags, fingerprint
//! - `DependencyGraph`: low-level edge tracking and cycle detection
//! - `WorkflowBuilder`: fluent interface for graph construction
//!
//! ## Assembly Operations
//!
//! Edges are declared against task names after the tasks exist, so a
//! reference to an undeclared task fails immediately:
//!
//! - [`Workflow::link`] — one ordering edge
//! - [`Workflow::sequence`] — a linear chain (N tasks, N−1 edges)
//! - [`Workflow::fan_out`] / [`Workflow::fan_in`] — one-to-many / many-to-one
//! - [`Workflow::splice_branches`] — loop-generated parallel sub-chains
//!   wired between a shared upstream and downstream anchor
//!
//! The assembled graph is a pure in-memory description; execution,
//! retries, and failure propagation belong to the external engine it is
//! eventually registered with (see [`crate::engine`]).

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::{has_path_connecting, is_cyclic_directed, toposort};
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};
use serde::Serialize;
use tracing::debug;

use crate::error::{ValidationError, WorkflowError};
use crate::schedule::Cadence;
use crate::task::TaskDescriptor;

/// Metadata attached to a [`Workflow`].
///
/// Everything here is graph-level configuration for the external engine:
/// when to run the graph, how often, how many retries a task gets by
/// default, and arbitrary organizational tags. The fingerprint is a
/// content-based hash set by [`Workflow::finalize`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowMetadata {
    /// When this definition was assembled.
    pub created_at: DateTime<Utc>,
    /// Content-based hash of the graph; empty until finalized.
    pub fingerprint: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Schedule cadence for the external engine, if any.
    pub cadence: Option<Cadence>,
    /// Start reference time for the schedule.
    pub start_date: Option<DateTime<Utc>>,
    /// Default retry count applied to every task by the engine.
    pub default_retries: u32,
    /// Arbitrary key-value tags.
    pub tags: HashMap<String, String>,
}

impl Default for WorkflowMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            fingerprint: String::new(),
            description: None,
            cadence: None,
            start_date: None,
            default_retries: 0,
            tags: HashMap::new(),
        }
    }
}

/// Low-level edge store for a workflow graph.
///
/// Edges are kept as an upstream list per downstream node, matching the
/// "predecessor gates successor" reading of an ordering constraint. Cycle
/// detection and topological sorting go through `petgraph`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexSet<String>,
    upstream: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Idempotent.
    pub fn add_node(&mut self, node: &str) {
        self.nodes.insert(node.to_string());
        self.upstream.entry(node.to_string()).or_default();
    }

    /// Add a directed edge `upstream -> downstream`. Declaring the same
    /// edge twice is a no-op.
    pub fn add_edge(&mut self, upstream: &str, downstream: &str) {
        self.add_node(upstream);
        self.add_node(downstream);
        let gates = self.upstream.entry(downstream.to_string()).or_default();
        if !gates.iter().any(|g| g == upstream) {
            gates.push(upstream.to_string());
        }
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Upstream gates of `node`, in declaration order.
    pub fn upstream_of(&self, node: &str) -> &[String] {
        self.upstream.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes gated by `node`.
    pub fn downstream_of(&self, node: &str) -> Vec<String> {
        self.upstream
            .iter()
            .filter(|(_, gates)| gates.iter().any(|g| g == node))
            .map(|(down, _)| down.clone())
            .collect()
    }

    /// All edges as `(upstream, downstream)` pairs.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.upstream
            .iter()
            .flat_map(|(down, gates)| gates.iter().map(move |up| (up.clone(), down.clone())))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.upstream.values().map(Vec::len).sum()
    }

    fn as_petgraph(&self) -> (Graph<String, (), Directed>, HashMap<String, NodeIndex>) {
        let mut graph = Graph::new();
        let mut indices = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            indices.insert(node.clone(), graph.add_node(node.clone()));
        }
        for (down, gates) in &self.upstream {
            for up in gates {
                graph.add_edge(indices[up], indices[down], ());
            }
        }
        (graph, indices)
    }

    pub fn has_cycles(&self) -> bool {
        let (graph, _) = self.as_petgraph();
        is_cyclic_directed(&graph)
    }

    /// Nodes in dependency-safe order.
    pub fn topological_sort(&self) -> Result<Vec<String>, ValidationError> {
        let (graph, _) = self.as_petgraph();
        toposort(&graph, None)
            .map(|sorted| sorted.into_iter().map(|idx| graph[idx].clone()).collect())
            .map_err(|_| ValidationError::CyclicDependency {
                cycle: self.find_cycle().unwrap_or_default(),
            })
    }

    /// Whether an ordering path `from -> ... -> to` exists.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let (graph, indices) = self.as_petgraph();
        match (indices.get(from), indices.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&graph, a, b, None),
            _ => false,
        }
    }

    /// One concrete cycle, for error reporting.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = IndexSet::new();
        let mut on_stack = IndexSet::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node.as_str()) {
                if let Some(cycle) = self.walk(node, &mut visited, &mut on_stack, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn walk(
        &self,
        node: &str,
        visited: &mut IndexSet<String>,
        on_stack: &mut IndexSet<String>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        visited.insert(node.to_string());
        on_stack.insert(node.to_string());
        path.push(node.to_string());

        for gate in self.upstream_of(node).to_vec() {
            if !visited.contains(gate.as_str()) {
                if let Some(cycle) = self.walk(&gate, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(gate.as_str()) {
                let start = path.iter().position(|n| *n == gate).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(gate);
                return Some(cycle);
            }
        }

        on_stack.swap_remove(node);
        path.pop();
        None
    }
}

/// A complete workflow definition: named tasks, ordering edges, metadata.
///
/// The set of tasks and edges must form a DAG with unique task names; see
/// [`Workflow::validate`]. A `Workflow` is never mutated after it is handed
/// to an engine via [`crate::engine::register`].
///
/// # Examples
///
/// ```rust
/// use trestle::{ActionRef, TaskDescriptor, Workflow};
///
/// let workflow = Workflow::builder("nightly_report")
///     .description("Assemble and ship the nightly report")
///     .add_task(TaskDescriptor::new("collect", ActionRef::new("http.fetch")?))?
///     .add_task(TaskDescriptor::new("render", ActionRef::new("reports.render")?))?
///     .sequence(&["collect", "render"])?
///     .build()?;
///
/// assert_eq!(workflow.name(), "nightly_report");
/// assert_eq!(workflow.edge_count(), 1);
/// assert!(!workflow.metadata().fingerprint.is_empty());
/// # Ok::<(), trestle::WorkflowError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    tasks: IndexMap<String, TaskDescriptor>,
    graph: DependencyGraph,
    metadata: WorkflowMetadata,
}

impl Workflow {
    /// Create an empty workflow. Most callers should prefer
    /// [`Workflow::builder`].
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tasks: IndexMap::new(),
            graph: DependencyGraph::new(),
            metadata: WorkflowMetadata::default(),
        }
    }

    /// Fluent construction entry point.
    pub fn builder(name: &str) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    pub fn set_description(&mut self, description: &str) {
        self.metadata.description = Some(description.to_string());
    }

    pub fn set_cadence(&mut self, cadence: Cadence) {
        self.metadata.cadence = Some(cadence);
    }

    pub fn set_start_date(&mut self, start_date: DateTime<Utc>) {
        self.metadata.start_date = Some(start_date);
    }

    pub fn set_default_retries(&mut self, retries: u32) {
        self.metadata.default_retries = retries;
    }

    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.metadata
            .tags
            .insert(key.to_string(), value.to_string());
    }

    /// Declare a task.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::DuplicateTask`] if a task with the same name is
    /// already declared.
    pub fn add_task(&mut self, task: TaskDescriptor) -> Result<(), WorkflowError> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(WorkflowError::DuplicateTask(name));
        }

        debug!(workflow = %self.name, task = %name, action = %task.action(), "declaring task");
        self.graph.add_node(&name);
        self.tasks.insert(name, task);
        Ok(())
    }

    /// Declare one ordering edge: `upstream` must succeed before
    /// `downstream` may start. Redeclaring an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownTask`] if either endpoint has not been
    /// declared, [`WorkflowError::SelfDependency`] if both endpoints are
    /// the same task.
    pub fn link(&mut self, upstream: &str, downstream: &str) -> Result<(), WorkflowError> {
        if !self.tasks.contains_key(upstream) {
            return Err(WorkflowError::UnknownTask(upstream.to_string()));
        }
        if !self.tasks.contains_key(downstream) {
            return Err(WorkflowError::UnknownTask(downstream.to_string()));
        }
        if upstream == downstream {
            return Err(WorkflowError::SelfDependency(upstream.to_string()));
        }

        debug!(workflow = %self.name, %upstream, %downstream, "declaring edge");
        self.graph.add_edge(upstream, downstream);
        Ok(())
    }

    /// Declare a linear chain of edges over `names`, each task gating the
    /// next. Equivalent to pairwise [`link`](Workflow::link) calls over
    /// consecutive elements; a chain of N tasks yields N−1 edges.
    pub fn sequence(&mut self, names: &[&str]) -> Result<(), WorkflowError> {
        for pair in names.windows(2) {
            self.link(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Declare one-to-many edges from `source` to every task in `targets`.
    /// No edges are created between the targets themselves.
    pub fn fan_out(&mut self, source: &str, targets: &[&str]) -> Result<(), WorkflowError> {
        for target in targets {
            self.link(source, target)?;
        }
        Ok(())
    }

    /// Declare many-to-one edges from every task in `sources` to `sink`.
    pub fn fan_in(&mut self, sources: &[&str], sink: &str) -> Result<(), WorkflowError> {
        for source in sources {
            self.link(source, sink)?;
        }
        Ok(())
    }

    /// Splice loop-generated parallel branches between two anchor tasks.
    ///
    /// Each branch is a short chain of fresh descriptors. For every branch
    /// the tasks are declared and wired
    /// `upstream -> branch[0] -> ... -> branch[last] -> downstream`.
    /// Branches stay mutually independent: no edge is created between
    /// tasks of different branches, so the engine may run them in
    /// parallel. An empty branch list (or an empty branch) is a no-op.
    ///
    /// Returns the names of the tasks that were declared, in declaration
    /// order.
    ///
    /// # Errors
    ///
    /// Fails fast on unknown anchors or duplicate task names. On error
    /// the workflow may already contain tasks from earlier branches;
    /// callers should treat the definition as poisoned and rebuild.
    pub fn splice_branches(
        &mut self,
        upstream: &str,
        downstream: &str,
        branches: Vec<Vec<TaskDescriptor>>,
    ) -> Result<Vec<String>, WorkflowError> {
        if !self.tasks.contains_key(upstream) {
            return Err(WorkflowError::UnknownTask(upstream.to_string()));
        }
        if !self.tasks.contains_key(downstream) {
            return Err(WorkflowError::UnknownTask(downstream.to_string()));
        }

        let mut created = Vec::new();
        for branch in branches {
            if branch.is_empty() {
                continue;
            }

            let names: Vec<String> = branch.iter().map(|t| t.name().to_string()).collect();
            for task in branch {
                self.add_task(task)?;
            }

            self.link(upstream, &names[0])?;
            for pair in names.windows(2) {
                self.link(&pair[0], &pair[1])?;
            }
            self.link(&names[names.len() - 1], downstream)?;

            created.extend(names);
        }
        Ok(created)
    }

    pub fn get_task(&self, name: &str) -> Option<&TaskDescriptor> {
        self.tasks.get(name)
    }

    /// Task names in declaration order.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Upstream gates of a task, or `None` for an unknown task.
    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        if self.tasks.contains_key(name) {
            Some(self.graph.upstream_of(name))
        } else {
            None
        }
    }

    /// Tasks gated by the given task.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.graph.downstream_of(name)
    }

    /// All ordering edges as `(upstream, downstream)` pairs.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph.edges()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check the graph invariants: non-empty, every edge endpoint
    /// declared, no cycles.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tasks.is_empty() {
            return Err(ValidationError::EmptyWorkflow);
        }

        for (up, down) in self.graph.edges() {
            if !self.tasks.contains_key(&up) {
                return Err(ValidationError::MissingDependency {
                    task: down,
                    dependency: up,
                });
            }
            if !self.tasks.contains_key(&down) {
                return Err(ValidationError::MissingDependency {
                    task: up,
                    dependency: down,
                });
            }
        }

        if self.graph.has_cycles() {
            return Err(ValidationError::CyclicDependency {
                cycle: self.graph.find_cycle().unwrap_or_default(),
            });
        }

        Ok(())
    }

    /// Task names in dependency-safe execution order.
    pub fn topological_sort(&self) -> Result<Vec<String>, ValidationError> {
        self.validate()?;
        self.graph.topological_sort()
    }

    /// Tasks grouped by execution level; all tasks within one level are
    /// mutually unordered and may run in parallel.
    pub fn execution_levels(&self) -> Result<Vec<Vec<String>>, ValidationError> {
        let sorted = self.topological_sort()?;
        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut level_of: HashMap<String, usize> = HashMap::new();

        for name in sorted {
            let level = self
                .graph
                .upstream_of(&name)
                .iter()
                .filter_map(|gate| level_of.get(gate))
                .max()
                .map(|deepest| deepest + 1)
                .unwrap_or(0);

            if levels.len() == level {
                levels.push(Vec::new());
            }
            levels[level].push(name.clone());
            level_of.insert(name, level);
        }

        Ok(levels)
    }

    /// Tasks with no upstream gates.
    pub fn roots(&self) -> Vec<String> {
        self.tasks
            .keys()
            .filter(|name| self.graph.upstream_of(name).is_empty())
            .cloned()
            .collect()
    }

    /// Tasks nothing else depends on. A caller wiring a terminal
    /// convergence task fans these into it.
    pub fn leaves(&self) -> Vec<String> {
        self.tasks
            .keys()
            .filter(|name| self.graph.downstream_of(name).is_empty())
            .cloned()
            .collect()
    }

    /// Whether two tasks have no ordering relationship in either
    /// direction.
    pub fn can_run_parallel(&self, a: &str, b: &str) -> bool {
        !self.graph.has_path(a, b) && !self.graph.has_path(b, a)
    }

    /// Deterministic content hash over topology, descriptors, and
    /// configuration. Two definitions with the same content produce the
    /// same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();

        let mut names: Vec<_> = self.tasks.keys().collect();
        names.sort();

        for name in &names {
            name.hash(&mut hasher);
            let mut gates = self.graph.upstream_of(name).to_vec();
            gates.sort();
            gates.hash(&mut hasher);
        }

        for name in &names {
            let task = &self.tasks[name.as_str()];
            task.action().path().hash(&mut hasher);
            let mut params: Vec<_> = task
                .params()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            params.sort();
            params.hash(&mut hasher);
        }

        self.name.hash(&mut hasher);
        self.metadata.description.hash(&mut hasher);
        self.metadata
            .cadence
            .as_ref()
            .map(Cadence::expression)
            .hash(&mut hasher);
        self.metadata
            .start_date
            .map(|d| d.timestamp())
            .hash(&mut hasher);
        self.metadata.default_retries.hash(&mut hasher);
        let mut tags: Vec<_> = self.metadata.tags.iter().collect();
        tags.sort_by_key(|(k, _)| k.as_str());
        tags.hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Compute and store the fingerprint. Called by
    /// [`WorkflowBuilder::build`]; direct `Workflow` users call it once
    /// assembly is finished.
    pub fn finalize(mut self) -> Self {
        self.metadata.fingerprint = self.fingerprint();
        self
    }
}

/// Fluent builder over [`Workflow`].
///
/// Assembly operations return `Result<Self, WorkflowError>` so misuse
/// (duplicate names, unknown references) surfaces at the exact call site.
///
/// # Examples
///
/// ```rust
/// use trestle::{ActionRef, TaskDescriptor, Workflow};
///
/// let workflow = Workflow::builder("fanout")
///     .tag("team", "data")
///     .add_task(TaskDescriptor::new("start", ActionRef::new("shell.run")?))?
///     .add_task(TaskDescriptor::new("left", ActionRef::new("shell.run")?))?
///     .add_task(TaskDescriptor::new("right", ActionRef::new("shell.run")?))?
///     .fan_out("start", &["left", "right"])?
///     .build()?;
///
/// assert_eq!(workflow.edge_count(), 2);
/// assert!(workflow.can_run_parallel("left", "right"));
/// # Ok::<(), trestle::WorkflowError>(())
/// ```
pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            workflow: Workflow::new(name),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.workflow.set_description(description);
        self
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.workflow.add_tag(key, value);
        self
    }

    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.workflow.set_cadence(cadence);
        self
    }

    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.workflow.set_start_date(start_date);
        self
    }

    pub fn default_retries(mut self, retries: u32) -> Self {
        self.workflow.set_default_retries(retries);
        self
    }

    pub fn add_task(mut self, task: TaskDescriptor) -> Result<Self, WorkflowError> {
        self.workflow.add_task(task)?;
        Ok(self)
    }

    pub fn link(mut self, upstream: &str, downstream: &str) -> Result<Self, WorkflowError> {
        self.workflow.link(upstream, downstream)?;
        Ok(self)
    }

    pub fn sequence(mut self, names: &[&str]) -> Result<Self, WorkflowError> {
        self.workflow.sequence(names)?;
        Ok(self)
    }

    pub fn fan_out(mut self, source: &str, targets: &[&str]) -> Result<Self, WorkflowError> {
        self.workflow.fan_out(source, targets)?;
        Ok(self)
    }

    pub fn fan_in(mut self, sources: &[&str], sink: &str) -> Result<Self, WorkflowError> {
        self.workflow.fan_in(sources, sink)?;
        Ok(self)
    }

    pub fn splice_branches(
        mut self,
        upstream: &str,
        downstream: &str,
        branches: Vec<Vec<TaskDescriptor>>,
    ) -> Result<Self, WorkflowError> {
        self.workflow.splice_branches(upstream, downstream, branches)?;
        Ok(self)
    }

    /// Validate and finalize the workflow.
    pub fn build(self) -> Result<Workflow, WorkflowError> {
        self.workflow.validate()?;
        Ok(self.workflow.finalize())
    }
}
