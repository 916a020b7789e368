//! Settings compilation — produce one fully merged, fully resolved record
//! per lifecycle stage, once, ahead of the event hot path.
//!
//! Merge rule (all -> stage): scalars override, `replace` submaps and `add`
//! merge key-by-key with the stage winning, `drop` lists union. Reference
//! strings are resolved exactly once, here; the compiled table never reads
//! the environment again.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use testrelay_core::Stage;
use tracing::debug;

use crate::model::{RawSettings, RawStageSettings};
use crate::resolve::Resolver;

/// The fully resolved settings for one stage, `"all"` layer already merged
/// underneath.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageSettings {
    /// Transmission channel address. `Some("")` suppresses the stage.
    pub tag: Option<String>,

    /// Sub-classification within the tag.
    pub label: Option<String>,

    /// Key renames in settings insertion order; last-applied wins on
    /// colliding targets.
    pub replace_keys: Vec<(String, String)>,

    /// Value substitutions keyed by the matched value.
    pub replace_values: serde_json::Map<String, Value>,

    /// Fields injected into every record of this stage.
    pub add: serde_json::Map<String, Value>,

    /// Fields removed from every record of this stage. Set semantics: drop
    /// is pure removal, order never observable.
    pub drop: BTreeSet<String>,
}

impl StageSettings {
    /// True when no entry remains once the keys named in `ignored` are
    /// removed from consideration. The patcher returns records unchanged for
    /// inert stages.
    pub fn is_empty_ignoring(&self, ignored: &[&str]) -> bool {
        let live = |key: &str| !ignored.contains(&key);
        !(live("tag") && self.tag.is_some()
            || live("label") && self.label.is_some()
            || live("replace")
                && !(self.replace_keys.is_empty() && self.replace_values.is_empty())
            || live("add") && !self.add.is_empty()
            || live("drop") && !self.drop.is_empty())
    }
}

/// The compiled per-stage table. Every [`Stage`] has an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompiledSettings {
    stages: BTreeMap<Stage, StageSettings>,
}

impl CompiledSettings {
    /// The compiled entry for `stage`.
    pub fn get(&self, stage: Stage) -> Option<&StageSettings> {
        self.stages.get(&stage)
    }

    /// Every distinct non-empty compiled tag. The router opens one channel
    /// per entry at startup.
    pub fn distinct_tags(&self) -> BTreeSet<String> {
        self.stages
            .values()
            .filter_map(|s| s.tag.as_deref())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Iterate `(stage, settings)` pairs in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageSettings)> {
        self.stages.iter().map(|(stage, s)| (*stage, s))
    }
}

/// Compile a raw document against resolution snapshots.
///
/// Every known stage (and the `logging` pseudo-stage) gets an entry; stage
/// names present in `raw` but unknown to [`Stage`] are ignored. Idempotent
/// for fixed snapshots.
pub fn compile(raw: &RawSettings, resolver: &Resolver) -> CompiledSettings {
    let all = raw
        .all
        .as_ref()
        .map(|entry| resolve_entry(entry, resolver))
        .unwrap_or_default();

    let mut stages = BTreeMap::new();
    for stage in Stage::ALL {
        let mut merged = all.clone();
        if let Some(entry) = raw.stages.get(stage.as_str()) {
            merge(&mut merged, resolve_entry(entry, resolver));
        }
        stages.insert(stage, merged);
    }

    for name in raw.stages.keys() {
        if Stage::from_key(name).is_none() {
            debug!(stage = %name, "Ignoring settings entry for unknown stage");
        }
    }

    CompiledSettings { stages }
}

/// Resolve every leaf of one raw entry. `replace` recurses into its own
/// `keys`/`values` submaps rather than being treated as a plain mapping.
fn resolve_entry(entry: &RawStageSettings, resolver: &Resolver) -> StageSettings {
    let (replace_keys, replace_values) = match &entry.replace {
        Some(replace) => (
            replace
                .keys
                .iter()
                // Non-string targets were rejected by validation upstream.
                .filter_map(|(old, new)| {
                    new.as_str().map(|n| (old.clone(), resolver.resolve(n)))
                })
                .collect(),
            resolver.resolve_map(&replace.values),
        ),
        None => (Vec::new(), serde_json::Map::new()),
    };

    StageSettings {
        tag: entry.tag.as_deref().map(|t| resolver.resolve(t)),
        label: entry.label.as_deref().map(|l| resolver.resolve(l)),
        replace_keys,
        replace_values,
        add: resolver.resolve_map(&entry.add),
        drop: entry.drop.iter().map(|d| resolver.resolve(d)).collect(),
    }
}

fn merge(base: &mut StageSettings, overlay: StageSettings) {
    if overlay.tag.is_some() {
        base.tag = overlay.tag;
    }
    if overlay.label.is_some() {
        base.label = overlay.label;
    }
    for (old, new) in overlay.replace_keys {
        match base.replace_keys.iter_mut().find(|(o, _)| *o == old) {
            Some(pair) => pair.1 = new,
            None => base.replace_keys.push((old, new)),
        }
    }
    for (from, to) in overlay.replace_values {
        base.replace_values.insert(from, to);
    }
    for (field, value) in overlay.add {
        base.add.insert(field, value);
    }
    base.drop.extend(overlay.drop);
}
