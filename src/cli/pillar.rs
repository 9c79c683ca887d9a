//! Pillar command.
//!
//! Compiles the pillar of one minion the way the orchestrator would and
//! prints it. A compile that degrades still succeeds; check the log with
//! `--verbose` to see why a value is missing.

use tracing::debug;

use crate::cli::{print_pillar, Format, GrainArgs, SettingsArgs};
use crate::core::config::Settings;
use crate::core::matcher::CompoundMatcher;
use crate::core::pillar::{compile, ext_pillar};
use crate::error::Result;

/// Compile and print the pillar of `minion_id`.
pub fn execute(
    minion_id: &str,
    grain_args: &GrainArgs,
    settings_args: &SettingsArgs,
    format: Format,
) -> Result<()> {
    let overrides = settings_args.overrides()?;
    let grains = grain_args.load()?;
    let matcher = CompoundMatcher::new().with_grains(minion_id, grains.clone());

    let pillar = match &settings_args.store {
        Some(path) => {
            debug!(path = %path.display(), "compiling against store snapshot");
            let settings = Settings::default().merge(&overrides);
            let store = settings_args.open_store(&settings)?;
            compile(minion_id, &grains, &settings, &store, &matcher)
        }
        None => ext_pillar(minion_id, &grains, &overrides, &matcher),
    };

    print_pillar(&pillar, format)
}
