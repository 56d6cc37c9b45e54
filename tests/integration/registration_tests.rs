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

use std::collections::HashSet;

use trestle::{
    init_test_logging, register, ActionRef, RecordingEngine, RegistrationError, TaskDescriptor,
    Workflow,
};

fn task(name: &str) -> TaskDescriptor {
    TaskDescriptor::new(name, ActionRef::new("shell.run").unwrap())
}

fn diamond() -> Workflow {
    let mut workflow = Workflow::new("diamond");
    for name in ["head", "left", "right", "tail"] {
        workflow.add_task(task(name)).unwrap();
    }
    workflow.fan_out("head", &["left", "right"]).unwrap();
    workflow.fan_in(&["left", "right"], "tail").unwrap();
    workflow.finalize()
}

#[test]
fn every_task_registered_before_any_edge_touching_it() {
    init_test_logging();

    let workflow = diamond();
    let mut engine = RecordingEngine::new();
    register(&workflow, &mut engine).unwrap();

    let registered: HashSet<String> = engine.task_names().into_iter().collect();
    for (up, down) in engine.edge_pairs() {
        assert!(registered.contains(up));
        assert!(registered.contains(down));
    }
    assert_eq!(engine.edge_count(), 4);
}

#[test]
fn handles_map_covers_every_task() {
    init_test_logging();

    let workflow = diamond();
    let mut engine = RecordingEngine::new();
    let handles = register(&workflow, &mut engine).unwrap();

    assert_eq!(handles.len(), workflow.task_count());
    for name in workflow.task_names() {
        let handle = handles.get(&name).expect("handle for every task");
        assert_eq!(handle.name(), name);
    }

    // Handles are unique.
    let ids: HashSet<_> = handles.values().map(|h| h.id()).collect();
    assert_eq!(ids.len(), handles.len());
}

#[test]
fn manifest_precedes_tasks_and_carries_fingerprint() {
    init_test_logging();

    let workflow = diamond();
    let mut engine = RecordingEngine::new();
    register(&workflow, &mut engine).unwrap();

    let manifest = engine.manifest().expect("graph registered");
    assert_eq!(manifest.name, "diamond");
    assert_eq!(manifest.fingerprint, workflow.metadata().fingerprint);
}

#[test]
fn cyclic_graph_never_reaches_the_engine() {
    init_test_logging();

    let mut workflow = Workflow::new("cyclic");
    workflow.add_task(task("a")).unwrap();
    workflow.add_task(task("b")).unwrap();
    workflow.link("a", "b").unwrap();
    workflow.link("b", "a").unwrap();

    let mut engine = RecordingEngine::new();
    assert!(matches!(
        register(&workflow, &mut engine),
        Err(RegistrationError::Validation(_))
    ));
    assert!(engine.manifest().is_none());
    assert_eq!(engine.task_count(), 0);
}
