//! Result-report classification — turn a host case report into the record
//! fields worth transmitting.
//!
//! Only decisive reports produce a record: a passed setup or teardown says
//! nothing the call phase doesn't, so it transmits nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use testrelay_core::Record;

/// The phase a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePhase {
    Setup,
    Call,
    Teardown,
}

impl CasePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePhase::Setup => "setup",
            CasePhase::Call => "call",
            CasePhase::Teardown => "teardown",
        }
    }
}

/// The host's raw verdict for one phase of one testcase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed,
    Skipped,
}

/// A testcase result report as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// Testcase identifier (e.g. `tests/test_api.py::test_get`).
    pub name: String,

    pub when: CasePhase,

    pub outcome: CaseOutcome,

    /// The testcase was marked as an expected failure.
    #[serde(default)]
    pub expected_failure: bool,

    /// The failure carried an exception chain rather than a plain assertion.
    #[serde(default)]
    pub exception_chain: bool,

    /// Phase duration in seconds.
    #[serde(default)]
    pub duration: f64,

    /// Failure text, when the phase failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,

    /// Marker names attached to the testcase.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,

    /// User-recorded properties, copied into the record verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub user_properties: serde_json::Map<String, Value>,

    /// Docstring of the testcase, forwarded when docstrings are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

/// Map a report to its transmitted verdict, or `None` when the report is
/// not decisive.
fn verdict(report: &CaseReport) -> Option<&'static str> {
    match (report.outcome, report.when) {
        (CaseOutcome::Passed, CasePhase::Call) => Some(if report.expected_failure {
            "xpassed"
        } else {
            "passed"
        }),
        (CaseOutcome::Failed, CasePhase::Call) => Some(if report.exception_chain {
            "error"
        } else {
            "failed"
        }),
        (CaseOutcome::Failed, CasePhase::Setup) => Some("error"),
        (CaseOutcome::Skipped, _) => Some(if report.expected_failure {
            "xfailed"
        } else {
            "skipped"
        }),
        _ => None,
    }
}

/// Build the result record for a report, or `None` when nothing should be
/// transmitted for it.
pub fn classify(report: &CaseReport) -> Option<Record> {
    let verdict = verdict(report)?;

    let mut record = report.user_properties.clone();
    record.insert("name".into(), Value::from(report.name.clone()));
    record.insert("outcome".into(), Value::from(verdict));
    record.insert("duration".into(), Value::from(report.duration));
    record.insert("markers".into(), Value::from(report.markers.clone()));
    if let Some(message) = report.failure_message.as_deref().filter(|m| !m.is_empty()) {
        record.insert("failure_message".into(), Value::from(message));
    }
    Some(record)
}
