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

//! Registration seam between assembled workflows and the external
//! execution engine.
//!
//! The [`Engine`] trait is the crate's only outward boundary: a graph
//! manifest, a task-registration call returning an opaque [`TaskHandle`],
//! and an edge-registration call over handle pairs. [`register`] walks a
//! validated [`Workflow`] through that interface — manifest first, then
//! tasks in dependency order, then edges — and stops at the first engine
//! rejection.
//!
//! [`RecordingEngine`] is the in-memory implementation used by this
//! crate's tests and examples; real deployments supply their own `Engine`
//! over whatever transport their scheduler speaks.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::error::RegistrationError;
use crate::task::TaskDescriptor;
use crate::workflow::Workflow;

/// Opaque handle an engine returns for a registered task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaskHandle {
    id: Uuid,
    name: String,
}

impl TaskHandle {
    /// Mint a fresh handle for a task name. Engines call this; assembly
    /// code only ever receives handles.
    pub fn mint(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Graph-level metadata handed to the engine alongside the tasks.
#[derive(Debug, Clone, Serialize)]
pub struct GraphManifest {
    pub name: String,
    pub fingerprint: String,
    pub description: Option<String>,
    /// Cron expression, if the graph is scheduled.
    pub cadence: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub default_retries: u32,
    pub tags: HashMap<String, String>,
}

impl GraphManifest {
    /// Snapshot the graph-level metadata of a workflow.
    pub fn of(workflow: &Workflow) -> Self {
        let metadata = workflow.metadata();
        Self {
            name: workflow.name().to_string(),
            fingerprint: metadata.fingerprint.clone(),
            description: metadata.description.clone(),
            cadence: metadata
                .cadence
                .as_ref()
                .map(|c| c.expression().to_string()),
            start_date: metadata.start_date,
            default_retries: metadata.default_retries,
            tags: metadata.tags.clone(),
        }
    }
}

/// The external execution engine's registration interface.
///
/// Implementations own all execution-time concerns (scheduling, retries,
/// failure propagation). This crate only promises to call
/// `register_graph` once, `register_task` once per task before any edge
/// that mentions it, and `register_edge` once per declared edge.
pub trait Engine {
    fn register_graph(&mut self, manifest: &GraphManifest) -> Result<(), RegistrationError>;

    fn register_task(&mut self, task: &TaskDescriptor) -> Result<TaskHandle, RegistrationError>;

    fn register_edge(
        &mut self,
        upstream: &TaskHandle,
        downstream: &TaskHandle,
    ) -> Result<(), RegistrationError>;
}

/// Validate `workflow` and register it with `engine`.
///
/// Tasks are registered in topological order and edges after both of
/// their endpoints, so a well-behaved engine never sees a dangling
/// reference. Returns the handle map by task name.
///
/// # Errors
///
/// Propagates [`RegistrationError::Validation`] for an invalid graph and
/// whatever the engine raises; the first error aborts registration.
pub fn register(
    workflow: &Workflow,
    engine: &mut dyn Engine,
) -> Result<IndexMap<String, TaskHandle>, RegistrationError> {
    let order = workflow.topological_sort()?;

    engine.register_graph(&GraphManifest::of(workflow))?;

    let mut handles: IndexMap<String, TaskHandle> = IndexMap::with_capacity(order.len());
    for name in &order {
        // topological_sort only yields declared tasks
        if let Some(task) = workflow.get_task(name) {
            let handle = engine.register_task(task)?;
            handles.insert(name.clone(), handle);
        }
    }

    for (up, down) in workflow.edges() {
        let upstream = handles
            .get(&up)
            .ok_or_else(|| RegistrationError::UnknownHandle(up.clone()))?;
        let downstream = handles
            .get(&down)
            .ok_or_else(|| RegistrationError::UnknownHandle(down.clone()))?;
        engine.register_edge(upstream, downstream)?;
    }

    info!(
        workflow = workflow.name(),
        tasks = handles.len(),
        edges = workflow.edge_count(),
        "workflow registered"
    );
    Ok(handles)
}

/// In-memory engine that records every registration call.
///
/// Rejects duplicate task names and edges over handles it has not issued,
/// mirroring the failure modes a real engine reports at registration
/// time.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    manifest: Option<GraphManifest>,
    tasks: IndexMap<String, (TaskHandle, TaskDescriptor)>,
    edges: Vec<(String, String)>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manifest received, if a graph was registered.
    pub fn manifest(&self) -> Option<&GraphManifest> {
        self.manifest.as_ref()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Registered task names, in registration order.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn descriptor(&self, name: &str) -> Option<&TaskDescriptor> {
        self.tasks.get(name).map(|(_, task)| task)
    }

    /// Recorded edges as `(upstream, downstream)` name pairs.
    pub fn edge_pairs(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving the named task.
    pub fn edges_from(&self, name: &str) -> Vec<&(String, String)> {
        self.edges.iter().filter(|(up, _)| up == name).collect()
    }

    /// Edges entering the named task.
    pub fn edges_into(&self, name: &str) -> Vec<&(String, String)> {
        self.edges.iter().filter(|(_, down)| down == name).collect()
    }
}

impl Engine for RecordingEngine {
    fn register_graph(&mut self, manifest: &GraphManifest) -> Result<(), RegistrationError> {
        if self.manifest.is_some() {
            return Err(RegistrationError::Rejected(format!(
                "engine already holds graph '{}'",
                manifest.name
            )));
        }
        self.manifest = Some(manifest.clone());
        Ok(())
    }

    fn register_task(&mut self, task: &TaskDescriptor) -> Result<TaskHandle, RegistrationError> {
        if self.tasks.contains_key(task.name()) {
            return Err(RegistrationError::DuplicateTask(task.name().to_string()));
        }
        let handle = TaskHandle::mint(task.name());
        self.tasks
            .insert(task.name().to_string(), (handle.clone(), task.clone()));
        Ok(handle)
    }

    fn register_edge(
        &mut self,
        upstream: &TaskHandle,
        downstream: &TaskHandle,
    ) -> Result<(), RegistrationError> {
        for handle in [upstream, downstream] {
            let known = self
                .tasks
                .get(handle.name())
                .map(|(issued, _)| issued == handle)
                .unwrap_or(false);
            if !known {
                return Err(RegistrationError::UnknownHandle(handle.name().to_string()));
            }
        }
        self.edges
            .push((upstream.name().to_string(), downstream.name().to_string()));
        Ok(())
    }
}
