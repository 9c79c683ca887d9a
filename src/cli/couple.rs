//! Couple command.
//!
//! Resolves a single location against the configured store, which is handy
//! for checking what a binding will produce before adding it to the mapping.

use crate::cli::{output, render, Format, SettingsArgs};
use crate::core::config::Settings;
use crate::core::location::Location;
use crate::core::resolver::Resolver;
use crate::error::Result;

/// Resolve `location` and print the value.
pub fn execute(location: &str, settings_args: &SettingsArgs, format: Format) -> Result<()> {
    let settings = Settings::default().merge(&settings_args.overrides()?);
    let store = settings_args.open_store(&settings)?;

    let location = Location::parse(location);
    let resolver = Resolver::new(store).unset_if_missing(settings.unset_if_missing);

    match resolver.couple(&location) {
        Some(value) => println!("{}", render(&value, format)?),
        None => output::dimmed(&format!("{}: unset", location)),
    }
    Ok(())
}
