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

//! Per-channel ETL example.
//!
//! Fetch placeholder data, clean it, analyze it, then fan out one
//! transfer-and-load branch per channel before converging into a single
//! export step:
//!
//! ```text
//! fetch -> clean -> analyze -> (transfer_X -> load_X)* -> export
//! ```
//!
//! Branches for different channels carry no edges between each other, so
//! the engine is free to run them in parallel. Per-channel transfer
//! commands come from a [`CommandTemplate`] so a bad path template fails
//! during assembly.

use chrono::{NaiveDate, TimeDelta, Utc};
use indexmap::IndexMap;

use crate::command::CommandTemplate;
use crate::error::WorkflowError;
use crate::pipelines::example_start_date;
use crate::schedule::Cadence;
use crate::task::{ActionRef, ParamValue, TaskDescriptor};
use crate::workflow::Workflow;

pub const WORKFLOW_NAME: &str = "channel_etl";

/// Channels whose records flow into the platform.
const INBOUND_CHANNELS: [&str; 4] = ["in_alpha", "in_bravo", "in_charlie", "in_delta"];
/// Channels whose records flow out of the platform.
const OUTBOUND_CHANNELS: [&str; 4] = ["out_alpha", "out_bravo", "out_charlie", "out_delta"];

const LOCAL_DIR: &str = "/tmp/";
const STAGING_DIR: &str = "/stage/";

/// Assemble the default definition: both channel directions, data from
/// yesterday.
pub fn workflow() -> Result<Workflow, WorkflowError> {
    let yesterday = Utc::now().date_naive() - TimeDelta::days(1);
    let channels: Vec<&str> = INBOUND_CHANNELS
        .iter()
        .chain(OUTBOUND_CHANNELS.iter())
        .copied()
        .collect();
    workflow_for(&channels, yesterday)
}

/// Assemble the definition for an explicit channel list and data date.
///
/// An empty channel list still produces a valid graph: the analyze step
/// fans into nothing and `export` keeps its direct gate on `analyze`.
pub fn workflow_for(channels: &[&str], data_date: NaiveDate) -> Result<Workflow, WorkflowError> {
    let transfer_command =
        CommandTemplate::parse("transfer put -f {local_dir}{file_name} {staging_dir}{channel}/")?;

    let mut builder = Workflow::builder(WORKFLOW_NAME)
        .description("Fetch, clean, and analyze channel records, then load each channel into the warehouse")
        .tag("kind", "example")
        .cadence(Cadence::daily())
        .start_date(example_start_date())
        .default_retries(1)
        .add_task(
            TaskDescriptor::new("fetch_records", ActionRef::new("http.fetch")?)
                .with_param("endpoint", "https://example.com/records")
                .with_param("date", data_date.to_string()),
        )?
        .add_task(TaskDescriptor::new(
            "clean_records",
            ActionRef::new("records.clean")?,
        ))?
        .add_task(TaskDescriptor::new(
            "analyze_records",
            ActionRef::new("records.analyze")?,
        ))?
        .add_task(
            TaskDescriptor::new("export_summary", ActionRef::new("warehouse.export")?)
                .with_param("table", "channel_summary"),
        )?
        .sequence(&["fetch_records", "clean_records", "analyze_records"])?;

    // Export always waits for analyze, even with no channels configured.
    builder = builder.link("analyze_records", "export_summary")?;

    let mut branches = Vec::with_capacity(channels.len());
    for channel in channels {
        branches.push(channel_branch(channel, data_date, &transfer_command)?);
    }

    builder
        .splice_branches("analyze_records", "export_summary", branches)?
        .build()
}

/// One per-channel sub-chain: move the channel's file to staging, then
/// load it into the channel's table partition.
fn channel_branch(
    channel: &str,
    data_date: NaiveDate,
    transfer_command: &CommandTemplate,
) -> Result<Vec<TaskDescriptor>, WorkflowError> {
    let file_name = format!("{}_{}.csv", channel, data_date);

    let mut command_params: IndexMap<String, ParamValue> = IndexMap::new();
    command_params.insert("local_dir".to_string(), LOCAL_DIR.into());
    command_params.insert("file_name".to_string(), file_name.clone().into());
    command_params.insert("staging_dir".to_string(), STAGING_DIR.into());
    command_params.insert("channel".to_string(), channel.into());

    let transfer = TaskDescriptor::new(
        &format!("transfer_{}", channel),
        ActionRef::new("shell.run")?,
    )
    .with_param("command", transfer_command.render(&command_params)?);

    let load = TaskDescriptor::new(
        &format!("load_{}", channel),
        ActionRef::new("warehouse.load")?,
    )
    .with_param("path", format!("{}{}/{}", STAGING_DIR, channel, file_name))
    .with_param("table", channel)
    .with_param("partition", data_date.to_string());

    Ok(vec![transfer, load])
}
