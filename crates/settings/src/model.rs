//! Raw settings model — the user-supplied document as parsed, before
//! reference resolution and merging.
//!
//! The typed serde model plus [`RawSettings::validate`] stand in for the
//! schema validation the compiler is allowed to assume: stage entries reject
//! unknown keys, `replace` only accepts the `{keys, values}` shape, and
//! `drop` only accepts strings. The compiler itself never re-validates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use testrelay_core::SettingsError;

/// A full settings document: the `"all"` layer plus per-stage entries.
///
/// Keys that are neither `"all"` nor a known stage name survive parsing and
/// are ignored by the compiler (forward compatibility with lifecycle hooks
/// the patcher does not yet route).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSettings {
    /// Defaults applied underneath every stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<RawStageSettings>,

    /// Stage-specific overrides, keyed by stage name.
    #[serde(flatten)]
    pub stages: BTreeMap<String, RawStageSettings>,
}

/// One stage entry (or the `"all"` layer) as written by the user.
///
/// `tag`, `label`, `add` values, and `drop` entries may be reference strings;
/// they stay unresolved here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<RawReplace>,

    /// Literal fields to inject into the record.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub add: serde_json::Map<String, Value>,

    /// Field names to remove from the record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop: Vec<String>,
}

/// The `replace` block. Only the tagged `{keys, values}` shape is supported;
/// the legacy flat key-rename map fails to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawReplace {
    /// Key renames: `old field name -> new field name`.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub keys: serde_json::Map<String, Value>,

    /// Value substitutions: `matched value -> replacement value`.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub values: serde_json::Map<String, Value>,
}

impl RawSettings {
    /// Check the constraints serde alone cannot express.
    ///
    /// Currently: every `replace.keys` target must be a string. Runs in the
    /// loader path, before compilation.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(all) = &self.all {
            validate_entry("all", all)?;
        }
        for (name, entry) in &self.stages {
            validate_entry(name, entry)?;
        }
        Ok(())
    }
}

fn validate_entry(name: &str, entry: &RawStageSettings) -> Result<(), SettingsError> {
    if let Some(replace) = &entry.replace {
        for (old, new) in &replace.keys {
            if !new.is_string() {
                return Err(SettingsError::Validation(format!(
                    "'{name}.replace.keys.{old}' must map to a string field name"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_and_stage_entries() {
        let doc = json!({
            "all": {"tag": "run", "label": "pytest"},
            "case_report": {
                "replace": {"keys": {"status": "state"}, "values": {"passed": "pass"}},
                "add": {"stop_info": "Testcase finished"},
                "drop": ["markers"]
            }
        });
        let raw: RawSettings = serde_json::from_value(doc).unwrap();
        assert_eq!(raw.all.as_ref().unwrap().tag.as_deref(), Some("run"));
        let report = &raw.stages["case_report"];
        assert_eq!(report.drop, ["markers"]);
        assert_eq!(
            report.replace.as_ref().unwrap().keys["status"],
            Value::from("state")
        );
    }

    #[test]
    fn unknown_stage_names_survive_parsing() {
        let doc = json!({"collection_start": {"tag": "x"}});
        let raw: RawSettings = serde_json::from_value(doc).unwrap();
        assert!(raw.stages.contains_key("collection_start"));
    }

    #[test]
    fn unknown_entry_key_is_rejected() {
        let doc = json!({"all": {"tag": "x", "replace_keys": {}}});
        assert!(serde_json::from_value::<RawSettings>(doc).is_err());
    }

    #[test]
    fn legacy_flat_replace_is_rejected() {
        let doc = json!({"all": {"replace": {"status": "state"}}});
        assert!(serde_json::from_value::<RawSettings>(doc).is_err());
    }

    #[test]
    fn non_string_drop_entry_is_rejected() {
        let doc = json!({"all": {"drop": ["ok", 3]}});
        assert!(serde_json::from_value::<RawSettings>(doc).is_err());
    }

    #[test]
    fn non_string_rename_target_fails_validation() {
        let doc = json!({"case_start": {"replace": {"keys": {"status": 1}}}});
        let raw: RawSettings = serde_json::from_value(doc).unwrap();
        let err = raw.validate().unwrap_err();
        assert!(err.to_string().contains("case_start.replace.keys.status"));
    }

    #[test]
    fn empty_document_is_valid() {
        let raw: RawSettings = serde_json::from_value(json!({})).unwrap();
        assert!(raw.all.is_none());
        assert!(raw.validate().is_ok());
    }
}
