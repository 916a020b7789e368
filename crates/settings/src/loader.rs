//! Settings document loading.
//!
//! Accepts a path to a `.json`/`.yaml`/`.yml` file, or an inline document
//! string (JSON tried first, then YAML). Validation runs before the document
//! is handed to the compiler.

use std::path::Path;

use testrelay_core::SettingsError;
use tracing::debug;

use crate::model::RawSettings;

/// Load a settings document from a path or an inline string.
///
/// If `source` names an existing file it is loaded by extension; otherwise
/// it is parsed as an inline document. Mirrors the host convention of
/// passing either a file path or the document itself on the command line.
pub fn load(source: &str) -> Result<RawSettings, SettingsError> {
    let path = Path::new(source);
    if path.exists() {
        load_from_path(path)
    } else {
        load_inline(source)
    }
}

/// Load and validate a settings file, dispatching on its extension.
pub fn load_from_path(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let raw: RawSettings = match extension {
        "json" => {
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?
        }
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?
        }
        other => {
            return Err(SettingsError::UnsupportedFormat(format!(
                "'{other}' (expected json, yaml, or yml)"
            )));
        }
    };

    debug!(path = %path.display(), "Loaded stage settings");
    raw.validate()?;
    Ok(raw)
}

/// Parse an inline settings document. JSON is tried first; YAML is the
/// fallback (YAML being a superset, a dedicated JSON pass gives the better
/// error for the common case).
pub fn load_inline(document: &str) -> Result<RawSettings, SettingsError> {
    let raw: RawSettings = match serde_json::from_str(document) {
        Ok(raw) => raw,
        Err(json_err) => serde_yaml::from_str(document)
            .map_err(|_| SettingsError::Parse(json_err.to_string()))?,
    };
    raw.validate()?;
    Ok(raw)
}
