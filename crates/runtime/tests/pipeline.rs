//! End-to-end pipeline tests: compiled reference settings driven by a full
//! replayed session, asserted against the exact record sequence a collector
//! would receive.

use std::sync::Arc;

use serde_json::json;
use testrelay_forward::{EventRouter, MemoryChannel};
use testrelay_patch::ContentPatcher;
use testrelay_runtime::{CaseOutcome, CasePhase, CaseReport, RelayOptions, RelayRuntime};
use testrelay_settings::{ArgSnapshot, EnvSnapshot, Resolver, compile};

fn build_runtime(
    doc: serde_json::Value,
    tags: &[&str],
) -> (RelayRuntime, Vec<Arc<MemoryChannel>>) {
    let raw = serde_json::from_value(doc).unwrap();
    let resolver = Resolver::new(
        EnvSnapshot::empty(),
        ArgSnapshot::from_pairs([("fluentd-tag", "test"), ("fluentd-label", "pytest")]),
    );
    let compiled = compile(&raw, &resolver);

    let mut router = EventRouter::new();
    let mut channels = Vec::new();
    for tag in tags {
        let channel = Arc::new(MemoryChannel::new(*tag));
        router.register(channel.clone());
        channels.push(channel);
    }

    let runtime = RelayRuntime::new(
        ContentPatcher::new(compiled),
        router,
        RelayOptions::default(),
    );
    (runtime, channels)
}

fn passed_call_report(name: &str) -> CaseReport {
    CaseReport {
        name: name.into(),
        when: CasePhase::Call,
        outcome: CaseOutcome::Passed,
        expected_failure: false,
        exception_chain: false,
        duration: 0.1,
        failure_message: None,
        markers: vec![],
        user_properties: serde_json::Map::new(),
        docstring: None,
    }
}

async fn drive_full_session(runtime: &RelayRuntime, case: &str) {
    runtime.session_start().await.unwrap();
    runtime.case_start(case).await.unwrap();
    runtime.case_report(&passed_call_report(case)).await.unwrap();
    runtime.case_finish(case).await.unwrap();
    runtime.session_finish().await.unwrap();
}

#[tokio::test]
async fn argument_references_address_every_stage() {
    let (runtime, channels) = build_runtime(
        json!({"all": {"tag": "<fluentd-tag>", "label": "<fluentd-label>"}}),
        &["test"],
    );
    let case = "test_base.py::test_base";
    drive_full_session(&runtime, case).await;

    let session_id = runtime.session_id().to_string();
    let emitted = channels[0].emitted().await;
    assert_eq!(emitted.len(), 5);
    for event in &emitted {
        assert_eq!(event.label.as_deref(), Some("pytest"));
        assert_eq!(event.record["sessionId"], session_id);
    }

    assert_eq!(emitted[0].record["status"], "start");
    assert_eq!(emitted[0].record["stage"], "session");

    assert_eq!(emitted[1].record["status"], "start");
    assert_eq!(emitted[1].record["stage"], "testcase");
    assert_eq!(emitted[1].record["name"], case);

    assert_eq!(emitted[2].record["outcome"], "passed");
    assert_eq!(emitted[2].record["when"], "call");

    assert_eq!(emitted[3].record["status"], "finish");
    assert_eq!(emitted[3].record["name"], case);

    assert_eq!(emitted[4].record["status"], "finish");
    assert_eq!(emitted[4].record["stage"], "session");
    assert!(emitted[4].record["duration"].is_f64());
}

#[tokio::test]
async fn renames_and_substitutions_apply_per_stage() {
    let (runtime, channels) = build_runtime(
        json!({
            "all": {
                "tag": "<fluentd-tag>",
                "label": "<fluentd-label>",
                "replace": {"keys": {"status": "state", "sessionId": "id"}}
            },
            "case_report": {
                "replace": {"values": {"passed": "pass", "failed": "fail"}},
                "add": {"stop_info": "Testcase finished"}
            }
        }),
        &["test"],
    );
    let case = "test_base.py::test_base";
    drive_full_session(&runtime, case).await;

    let session_id = runtime.session_id().to_string();
    let emitted = channels[0].emitted().await;
    assert_eq!(emitted.len(), 5);

    // the all-layer key renames apply everywhere
    for event in &emitted {
        assert!(!event.record.contains_key("status"));
        assert_eq!(event.record["id"], session_id);
        assert!(!event.record.contains_key("sessionId"));
    }
    assert_eq!(emitted[0].record["state"], "start");
    assert_eq!(emitted[4].record["state"], "finish");

    // the report stage adds its own value substitution and injected field
    let report = &emitted[2].record;
    assert_eq!(report["outcome"], "pass");
    assert_eq!(report["stop_info"], "Testcase finished");
    // value substitution stays scoped to its stage
    assert_eq!(emitted[1].record.get("stop_info"), None);
}

#[tokio::test]
async fn empty_all_tag_suppresses_every_stage_but_the_overridden_one() {
    let (runtime, channels) = build_runtime(
        json!({
            "all": {"tag": "", "label": ""},
            "case_report": {
                "tag": "<fluentd-tag>",
                "label": "<fluentd-label>",
                "add": {"stop_info": "Testcase finished"}
            }
        }),
        &["test"],
    );
    let case = "test_base.py::test_base";
    drive_full_session(&runtime, case).await;

    let emitted = channels[0].emitted().await;
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].record["outcome"], "passed");
    assert_eq!(emitted[0].record["stop_info"], "Testcase finished");
}

#[tokio::test]
async fn stages_route_to_their_own_tags() {
    let (runtime, channels) = build_runtime(
        json!({
            "all": {"tag": "run", "label": "pytest"},
            "case_report": {"tag": "result"},
            "session_finish": {"tag": "result"}
        }),
        &["run", "result"],
    );
    let case = "test_base.py::test_base";
    drive_full_session(&runtime, case).await;

    let run = channels[0].emitted().await;
    let result = channels[1].emitted().await;
    assert_eq!(run.len(), 3); // session_start, case_start, case_finish
    assert_eq!(result.len(), 2); // case_report, session_finish
    assert_eq!(result[0].record["outcome"], "passed");
    assert_eq!(result[1].record["stage"], "session");
}

#[tokio::test]
async fn environment_references_resolve_into_added_fields() {
    let raw = serde_json::from_value(json!({
        "all": {"tag": "run", "label": "pytest"},
        "session_start": {"add": {"greeting": "${PIPELINE_GREETING}", "absent": "${PIPELINE_ABSENT}"}}
    }))
    .unwrap();
    let resolver = Resolver::new(
        EnvSnapshot::from_pairs([("PIPELINE_GREETING", "hello")]),
        ArgSnapshot::empty(),
    );
    let compiled = compile(&raw, &resolver);

    let channel = Arc::new(MemoryChannel::new("run"));
    let mut router = EventRouter::new();
    router.register(channel.clone());
    let runtime = RelayRuntime::new(
        ContentPatcher::new(compiled),
        router,
        RelayOptions::default(),
    );

    runtime.session_start().await.unwrap();
    let emitted = channel.emitted().await;
    assert_eq!(emitted[0].record["greeting"], "hello");
    assert_eq!(emitted[0].record["absent"], "");
}
