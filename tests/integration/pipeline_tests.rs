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

use serial_test::serial;
use trestle::pipelines::{self, channel_etl, job_submission};
use trestle::{init_test_logging, register, workflow_constructor, RecordingEngine};

#[test]
#[serial]
fn register_all_exposes_both_examples() {
    init_test_logging();
    pipelines::register_all();

    for name in [job_submission::WORKFLOW_NAME, channel_etl::WORKFLOW_NAME] {
        let workflow = workflow_constructor(name)
            .expect("example constructor registered")
            .expect("example assembles cleanly");
        assert_eq!(workflow.name(), name);
        assert!(workflow.validate().is_ok());
        assert!(!workflow.metadata().fingerprint.is_empty());
    }
}

#[test]
fn job_submission_registers_as_linear_chain() {
    init_test_logging();

    let workflow = job_submission::workflow().unwrap();
    let mut engine = RecordingEngine::new();
    register(&workflow, &mut engine).unwrap();

    assert_eq!(engine.task_count(), 4);
    assert_eq!(engine.edge_count(), 3);
    assert_eq!(
        engine.task_names(),
        vec![
            "submit_job",
            "warehouse_to_cluster",
            "cluster_to_warehouse",
            "summary_query"
        ]
    );
}

#[test]
fn channel_etl_two_channel_scenario_through_engine() {
    init_test_logging();

    let date = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let workflow = channel_etl::workflow_for(&["a", "b"], date).unwrap();
    let mut engine = RecordingEngine::new();
    register(&workflow, &mut engine).unwrap();

    // 4 base tasks + 2 identifiers * 2-task sub-chain.
    assert_eq!(engine.task_count(), 8);

    let fan_out: Vec<_> = engine
        .edges_from("analyze_records")
        .into_iter()
        .filter(|(_, down)| down != "export_summary")
        .collect();
    let fan_in: Vec<_> = engine
        .edges_into("export_summary")
        .into_iter()
        .filter(|(up, _)| up != "analyze_records")
        .collect();
    assert_eq!(fan_out.len(), 2);
    assert_eq!(fan_in.len(), 2);

    for id in ["a", "b"] {
        let internal = (format!("transfer_{}", id), format!("load_{}", id));
        assert!(engine.edge_pairs().contains(&internal));
    }

    // No recorded edge connects the a-chain to the b-chain.
    let crossing = engine.edge_pairs().iter().any(|(up, down)| {
        (up.ends_with("_a") && down.ends_with("_b")) || (up.ends_with("_b") && down.ends_with("_a"))
    });
    assert!(!crossing);
}

#[test]
fn channel_etl_metadata_reaches_manifest() {
    init_test_logging();

    let workflow = channel_etl::workflow().unwrap();
    let mut engine = RecordingEngine::new();
    register(&workflow, &mut engine).unwrap();

    let manifest = engine.manifest().unwrap();
    assert_eq!(manifest.name, channel_etl::WORKFLOW_NAME);
    assert_eq!(manifest.cadence.as_deref(), Some("0 0 * * *"));
    assert_eq!(manifest.default_retries, 1);
    assert!(manifest.start_date.is_some());
    assert_eq!(manifest.tags.get("kind").map(String::as_str), Some("example"));
}

#[test]
fn generated_commands_carry_channel_paths() {
    init_test_logging();

    let date = chrono::NaiveDate::from_ymd_opt(2021, 6, 15).unwrap();
    let workflow = channel_etl::workflow_for(&["in_alpha", "out_bravo"], date).unwrap();

    for channel in ["in_alpha", "out_bravo"] {
        let transfer = workflow.get_task(&format!("transfer_{}", channel)).unwrap();
        let command = transfer.param("command").unwrap().to_string();
        assert!(command.contains(&format!("/tmp/{}_2021-06-15.csv", channel)));
        assert!(command.ends_with(&format!("/stage/{}/", channel)));
    }
}
