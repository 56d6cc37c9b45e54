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

//! Distributed job submission example.
//!
//! A linear chain of four connector tasks: submit a processing job, pull
//! a source table into the cluster, push the processed result back to the
//! warehouse, then run a summary query over it. Each step gates the next.

use crate::error::WorkflowError;
use crate::pipelines::example_start_date;
use crate::task::{ActionRef, TaskDescriptor};
use crate::workflow::Workflow;

pub const WORKFLOW_NAME: &str = "job_submission";

/// Assemble the job submission workflow.
pub fn workflow() -> Result<Workflow, WorkflowError> {
    let submit = TaskDescriptor::new("submit_job", ActionRef::new("jobs.submit")?)
        .with_param("application", "apps/estimate_pi.py")
        .with_param("deploy_mode", "cluster");

    let ingest = TaskDescriptor::new("warehouse_to_cluster", ActionRef::new("warehouse.interchange")?)
        .with_param("direction", "warehouse_to_cluster")
        .with_param("source_table", "events")
        .with_param("staging_table", "events_staging")
        .with_param("save_mode", "overwrite")
        .with_param("save_format", "JSON");

    let publish = TaskDescriptor::new("cluster_to_warehouse", ActionRef::new("warehouse.interchange")?)
        .with_param("direction", "cluster_to_warehouse")
        .with_param("source_table", "events_staging")
        .with_param("staging_table", "events")
        .with_param("save_mode", "append")
        .with_param("save_format", "JSON");

    let summarize = TaskDescriptor::new("summary_query", ActionRef::new("warehouse.query")?)
        .with_param("query", "SELECT COUNT(1) AS cnt FROM events_staging");

    Workflow::builder(WORKFLOW_NAME)
        .description("Submit a processing job and exchange its results with the warehouse")
        .tag("kind", "example")
        .start_date(example_start_date())
        .add_task(submit)?
        .add_task(ingest)?
        .add_task(publish)?
        .add_task(summarize)?
        .sequence(&[
            "submit_job",
            "warehouse_to_cluster",
            "cluster_to_warehouse",
            "summary_query",
        ])?
        .build()
}
