//! `testrelay check` — validate a settings document and show what the
//! pipeline would actually use.

use testrelay_core::Result;
use testrelay_settings::{compile, load};
use tracing::info;

use super::RelayArgs;

pub fn run(relay: &RelayArgs) -> Result<()> {
    let raw = load(&relay.settings)?;
    let compiled = compile(&raw, &relay.resolver());

    let tags = compiled.distinct_tags();
    info!(channels = tags.len(), "Settings compiled");

    println!("{}", serde_json::to_string_pretty(&compiled)?);
    Ok(())
}
