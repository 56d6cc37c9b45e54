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

//! Example workflow definitions.
//!
//! Two complete graph definitions built with this crate's assembler:
//!
//! - [`job_submission`]: a linear chain submitting a distributed
//!   processing job and exchanging its results with the warehouse
//! - [`channel_etl`]: a fan-out/fan-in ETL over a set of named channels,
//!   with per-channel transfer and load branches generated in a loop
//!
//! Every operation is delegated to connector actions the external engine
//! supplies; these modules only declare descriptors and ordering.

use chrono::{DateTime, TimeZone, Utc};

use crate::registry::register_workflow_constructor;

pub mod channel_etl;
pub mod job_submission;

/// Fixed start reference used by both example definitions.
pub(crate) fn example_start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0)
        .single()
        .expect("2021-01-01T00:00:00Z is a valid timestamp")
}

/// Install both example constructors in the global workflow registry.
pub fn register_all() {
    register_workflow_constructor(job_submission::WORKFLOW_NAME, job_submission::workflow);
    register_workflow_constructor(channel_etl::WORKFLOW_NAME, channel_etl::workflow);
}
