//! Lifecycle stages — the fixed set of points at which the host produces
//! an event record, plus the `logging` pseudo-stage used by the ambient-log
//! bridge.
//!
//! The set is closed on purpose: settings documents may mention stages this
//! enum does not know (they are ignored at compile time), but nothing in the
//! pipeline can be driven with a stage outside this enum.

use serde::{Deserialize, Serialize};

/// A named point in the host's test-execution lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Test session begins.
    SessionStart,
    /// Test session ends.
    SessionFinish,
    /// A testcase begins.
    CaseStart,
    /// A testcase result report is produced.
    CaseReport,
    /// A testcase ends.
    CaseFinish,
    /// Pseudo-stage for records produced by the ambient logging bridge.
    Logging,
}

impl Stage {
    /// Every stage, in lifecycle order. All of these are compiled, always.
    pub const ALL: [Stage; 6] = [
        Stage::SessionStart,
        Stage::SessionFinish,
        Stage::CaseStart,
        Stage::CaseReport,
        Stage::CaseFinish,
        Stage::Logging,
    ];

    /// The stage name as it appears as a settings-document key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SessionStart => "session_start",
            Stage::SessionFinish => "session_finish",
            Stage::CaseStart => "case_start",
            Stage::CaseReport => "case_report",
            Stage::CaseFinish => "case_finish",
            Stage::Logging => "logging",
        }
    }

    /// The coarse phase tag carried in the `stage` field of event records.
    pub fn phase(&self) -> &'static str {
        match self {
            Stage::SessionStart | Stage::SessionFinish => "session",
            Stage::CaseStart | Stage::CaseReport | Stage::CaseFinish => "testcase",
            Stage::Logging => "logging",
        }
    }

    /// Parse a settings-document key. Returns `None` for unknown names
    /// (unknown stages are ignored, not rejected).
    pub fn from_key(key: &str) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.as_str() == key)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
