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

//! # Trestle
//!
//! Trestle assembles workflow task graphs for external execution engines.
//! It owns the declarative half of a pipeline — named task descriptors,
//! ordering edges, graph metadata — and hands the finished DAG to whatever
//! scheduler actually runs it. It executes nothing itself: no connectors,
//! no retries, no state.
//!
//! ## Core Concepts
//!
//! - [`TaskDescriptor`]: a named unit of work, its [`ActionRef`] into the
//!   engine's connector catalog, and scalar parameters
//! - [`Workflow`]: the graph — descriptors, edges, and metadata
//!   (cadence, start date, retries, tags, content fingerprint)
//! - Assembly operations: [`Workflow::sequence`], [`Workflow::fan_out`],
//!   [`Workflow::fan_in`], and [`Workflow::splice_branches`] for
//!   loop-generated parallel branches
//! - [`Engine`]: the registration seam; [`register`] walks a validated
//!   graph through it
//!
//! ## Example
//!
//! ```rust
//! use trestle::{ActionRef, RecordingEngine, TaskDescriptor, Workflow};
//!
//! let workflow = Workflow::builder("example")
//!     .add_task(TaskDescriptor::new("extract", ActionRef::new("http.fetch")?))?
//!     .add_task(TaskDescriptor::new("load", ActionRef::new("warehouse.load")?))?
//!     .sequence(&["extract", "load"])?
//!     .build()?;
//!
//! let mut engine = RecordingEngine::new();
//! let handles = trestle::register(&workflow, &mut engine)?;
//! assert_eq!(handles.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod pipelines;
pub mod registry;
pub mod schedule;
pub mod task;
pub mod workflow;

pub use command::CommandTemplate;
pub use engine::{register, Engine, GraphManifest, RecordingEngine, TaskHandle};
pub use error::{
    RegistrationError, ScheduleError, TemplateError, ValidationError, WorkflowError,
};
pub use registry::{
    assembled_workflows, register_workflow_constructor, registered_workflow_names,
    workflow_constructor,
};
pub use schedule::Cadence;
pub use task::{ActionRef, ParamValue, TaskDescriptor};
pub use workflow::{DependencyGraph, Workflow, WorkflowBuilder, WorkflowMetadata};

/// Initialize tracing for tests. Safe to call repeatedly; only the first
/// call installs a subscriber.
pub fn init_test_logging() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trestle=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
