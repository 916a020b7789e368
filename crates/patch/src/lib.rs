//! Content patching — transform one event record according to the compiled
//! settings of its stage.
//!
//! This runs once per lifecycle event, on the hot path: key renames, value
//! substitutions, field injection, field removal. The patcher holds no
//! event-to-event state; it is a pure function of (compiled settings,
//! record, stage, ignore set).

use testrelay_core::{PatchError, Record, Stage};
use testrelay_settings::CompiledSettings;

/// Patches transmission content according to the compiled user settings.
#[derive(Debug, Clone)]
pub struct ContentPatcher {
    settings: CompiledSettings,
}

impl ContentPatcher {
    pub fn new(settings: CompiledSettings) -> Self {
        Self { settings }
    }

    /// The compiled per-stage table this patcher consults.
    pub fn settings(&self) -> &CompiledSettings {
        &self.settings
    }

    /// Patch a record for `stage`.
    pub fn patch(&self, record: Record, stage: Stage) -> Record {
        self.patch_filtered(record, stage, &[])
    }

    /// Patch a record for `stage`, with the settings keys named in `ignored`
    /// removed from consideration. The log bridge uses this with
    /// `["tag", "label"]` so a stage configured with nothing but an address
    /// is treated as inert.
    pub fn patch_filtered(&self, record: Record, stage: Stage, ignored: &[&str]) -> Record {
        let Some(settings) = self.settings.get(stage) else {
            return record;
        };
        if settings.is_empty_ignoring(ignored) {
            return record;
        }
        let live = |key: &str| !ignored.contains(&key);
        let mut patched = record;

        // 1. Key rename: move the value, delete the old key. Application
        // order is settings insertion order; last-applied wins on collision.
        if live("replace") {
            for (old, new) in &settings.replace_keys {
                if let Some(value) = patched.shift_remove(old) {
                    patched.insert(new.clone(), value);
                }
            }

            // 2. Value rename: every non-mapping field whose value matches a
            // table key is substituted, including several fields holding the
            // same literal. Mapping-valued fields are never substituted.
            if !settings.replace_values.is_empty() {
                for (_, value) in patched.iter_mut() {
                    if value.is_object() {
                        continue;
                    }
                    let Some(current) = value.as_str() else {
                        continue;
                    };
                    if let Some(replacement) = settings.replace_values.get(current) {
                        *value = replacement.clone();
                    }
                }
            }
        }

        // 3. Field injection, overwriting same-named fields.
        if live("add") {
            for (field, value) in &settings.add {
                patched.insert(field.clone(), value.clone());
            }
        }

        // 4. Field removal; absent names are silently ignored.
        if live("drop") {
            for field in &settings.drop {
                patched.shift_remove(field);
            }
        }

        patched
    }

    /// The compiled `(tag, label)` address for `stage`.
    ///
    /// A missing entry is a configuration defect, surfaced to the caller
    /// rather than defaulted.
    pub fn tag_and_label(&self, stage: Stage) -> Result<(String, String), PatchError> {
        let settings = self
            .settings
            .get(stage)
            .ok_or(PatchError::MissingRoute { stage })?;
        match (&settings.tag, &settings.label) {
            (Some(tag), Some(label)) => Ok((tag.clone(), label.clone())),
            _ => Err(PatchError::MissingRoute { stage }),
        }
    }

    /// The compiled tag for `stage`, if any. `Some("")` means the stage is
    /// deliberately suppressed.
    pub fn tag(&self, stage: Stage) -> Option<&str> {
        self.settings.get(stage).and_then(|s| s.tag.as_deref())
    }

    /// The compiled label for `stage`, if any.
    pub fn label(&self, stage: Stage) -> Option<&str> {
        self.settings.get(stage).and_then(|s| s.label.as_deref())
    }
}
