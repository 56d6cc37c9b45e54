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

use trestle::{
    init_test_logging, ActionRef, TaskDescriptor, ValidationError, Workflow, WorkflowError,
};

fn task(name: &str) -> TaskDescriptor {
    TaskDescriptor::new(name, ActionRef::new("shell.run").unwrap())
}

#[test]
fn sequence_of_n_tasks_yields_n_minus_one_edges() {
    init_test_logging();

    for n in 2..=6 {
        let names: Vec<String> = (0..n).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut workflow = Workflow::new("seq");
        for name in &refs {
            workflow.add_task(task(name)).unwrap();
        }
        workflow.sequence(&refs).unwrap();

        assert_eq!(workflow.edge_count(), n - 1);
        for pair in refs.windows(2) {
            assert!(workflow
                .edges()
                .contains(&(pair[0].to_string(), pair[1].to_string())));
        }
    }
}

#[test]
fn fan_out_creates_one_edge_per_target_and_none_between_targets() {
    init_test_logging();

    let targets = ["m1", "m2", "m3", "m4"];
    let mut workflow = Workflow::new("fanout");
    workflow.add_task(task("src")).unwrap();
    for name in targets {
        workflow.add_task(task(name)).unwrap();
    }
    workflow.fan_out("src", &targets).unwrap();

    assert_eq!(workflow.edge_count(), targets.len());
    assert!(workflow.edges().iter().all(|(up, _)| up == "src"));
    for (i, a) in targets.iter().enumerate() {
        for b in &targets[i + 1..] {
            assert!(workflow.can_run_parallel(a, b));
        }
    }
}

#[test]
fn loop_generated_branches_stay_independent() {
    init_test_logging();

    let identifiers = ["w", "x", "y", "z"];
    let mut workflow = Workflow::new("branches");
    workflow.add_task(task("analyze")).unwrap();
    workflow.add_task(task("export")).unwrap();

    let branches: Vec<Vec<TaskDescriptor>> = identifiers
        .iter()
        .map(|id| {
            vec![
                task(&format!("transfer_{}", id)),
                task(&format!("load_{}", id)),
            ]
        })
        .collect();
    workflow
        .splice_branches("analyze", "export", branches)
        .unwrap();

    // K independent chains, each gated by analyze and gating export.
    for id in identifiers {
        let transfer = format!("transfer_{}", id);
        let load = format!("load_{}", id);
        assert_eq!(
            workflow.dependencies_of(&transfer).unwrap().to_vec(),
            vec!["analyze"]
        );
        assert_eq!(
            workflow.dependencies_of(&load).unwrap().to_vec(),
            vec![transfer.clone()]
        );
        assert!(workflow.dependents_of(&load).contains(&"export".to_string()));
    }

    for (i, a) in identifiers.iter().enumerate() {
        for b in &identifiers[i + 1..] {
            assert!(workflow.can_run_parallel(&format!("load_{}", a), &format!("load_{}", b)));
            assert!(workflow
                .can_run_parallel(&format!("transfer_{}", a), &format!("load_{}", b)));
        }
    }

    // Every branch sits in the same two execution levels.
    let levels = workflow.execution_levels().unwrap();
    assert_eq!(levels.len(), 4);
    assert_eq!(levels[1].len(), identifiers.len());
    assert_eq!(levels[2].len(), identifiers.len());
}

#[test]
fn duplicate_names_rejected_across_assembly_paths() {
    init_test_logging();

    let result = Workflow::builder("dups")
        .add_task(task("t"))
        .and_then(|b| b.add_task(task("t")));
    assert!(matches!(result, Err(WorkflowError::DuplicateTask(_))));

    let mut workflow = Workflow::new("dups2");
    workflow.add_task(task("analyze")).unwrap();
    workflow.add_task(task("export")).unwrap();
    workflow.add_task(task("transfer_a")).unwrap();
    assert!(matches!(
        workflow.splice_branches("analyze", "export", vec![vec![task("transfer_a")]]),
        Err(WorkflowError::DuplicateTask(_))
    ));
}

#[test]
fn builder_surfaces_cycles_at_build_time() {
    init_test_logging();

    let result = Workflow::builder("cyclic")
        .add_task(task("a"))
        .unwrap()
        .add_task(task("b"))
        .unwrap()
        .link("a", "b")
        .unwrap()
        .link("b", "a")
        .unwrap()
        .build();

    assert!(matches!(
        result,
        Err(WorkflowError::Validation(
            ValidationError::CyclicDependency { .. }
        ))
    ));
}
