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

//! Global registry of workflow constructors.
//!
//! Definitions register a constructor closure by name so that tooling can
//! enumerate and assemble every known workflow without hard-coding the
//! list. Constructors are fallible: assembly errors surface to whoever
//! asks for the workflow, not at registration.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::WorkflowError;
use crate::workflow::Workflow;

type Constructor = Box<dyn Fn() -> Result<Workflow, WorkflowError> + Send + Sync>;

static WORKFLOW_REGISTRY: Lazy<Arc<Mutex<HashMap<String, Constructor>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

/// Register a workflow constructor under `name`, replacing any previous
/// constructor with the same name.
pub fn register_workflow_constructor<F>(name: &str, constructor: F)
where
    F: Fn() -> Result<Workflow, WorkflowError> + Send + Sync + 'static,
{
    let mut registry = WORKFLOW_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name.to_string(), Box::new(constructor));
}

/// Assemble the named workflow, if a constructor is registered.
pub fn workflow_constructor(name: &str) -> Option<Result<Workflow, WorkflowError>> {
    let registry = WORKFLOW_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.get(name).map(|constructor| constructor())
}

/// Names of every registered workflow, sorted.
pub fn registered_workflow_names() -> Vec<String> {
    let registry = WORKFLOW_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<String> = registry.keys().cloned().collect();
    names.sort();
    names
}

/// Assemble every registered workflow.
pub fn assembled_workflows() -> Result<Vec<Workflow>, WorkflowError> {
    let registry = WORKFLOW_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<&String> = registry.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| registry[name]())
        .collect()
}
