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

//! Error types used across the crate.
//!
//! Each concern gets its own enum: graph assembly (`WorkflowError`),
//! whole-graph validation (`ValidationError`), command templating
//! (`TemplateError`), cadence parsing (`ScheduleError`), and the
//! registration seam to the external engine (`RegistrationError`).

use thiserror::Error;

/// Errors raised while declaring tasks and edges on a workflow graph.
///
/// Caller misuse (duplicate names, references to tasks that were never
/// declared) fails fast here rather than being deferred to validation.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Task '{0}' is already declared in this workflow")]
    DuplicateTask(String),

    #[error("Task '{0}' is not declared in this workflow")]
    UnknownTask(String),

    #[error("Task '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Invalid action reference '{0}': expected non-empty dot-separated segments")]
    InvalidActionRef(String),

    #[error("Workflow validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Command template error: {0}")]
    Template(#[from] TemplateError),
}

/// Errors found when validating an assembled graph before registration.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Workflow contains no tasks")]
    EmptyWorkflow,

    #[error("Task '{task}' depends on '{dependency}', which is not part of the workflow")]
    MissingDependency { task: String, dependency: String },

    #[error("Workflow contains a dependency cycle: {cycle:?}")]
    CyclicDependency { cycle: Vec<String> },
}

/// Errors from parsing or rendering a [`CommandTemplate`](crate::CommandTemplate).
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unterminated placeholder starting at byte {position}")]
    UnterminatedPlaceholder { position: usize },

    #[error("Empty placeholder at byte {position}")]
    EmptyPlaceholder { position: usize },

    #[error("Unmatched '}}' at byte {position}")]
    UnmatchedClose { position: usize },

    #[error("No parameter supplied for placeholder '{0}'")]
    MissingParam(String),
}

/// Errors from parsing a schedule cadence.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{pattern}': {source}")]
    InvalidCron {
        pattern: String,
        #[source]
        source: croner::errors::CronError,
    },

    #[error("Unknown cadence preset '{0}'")]
    UnknownPreset(String),
}

/// Errors surfaced while handing an assembled graph to an external engine.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Workflow failed validation before registration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Engine already holds a task named '{0}'")]
    DuplicateTask(String),

    #[error("Edge references a task handle the engine has not seen: '{0}'")]
    UnknownHandle(String),

    #[error("Engine rejected the registration: {0}")]
    Rejected(String),
}
