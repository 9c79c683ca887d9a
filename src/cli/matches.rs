//! Match command.

use crate::cli::{output, GrainArgs};
use crate::core::matcher::{CompoundMatcher, HostMatcher};
use crate::error::Result;

/// Evaluate `expr` for `minion_id` and report the outcome.
pub fn execute(minion_id: &str, expr: &str, grain_args: &GrainArgs) -> Result<()> {
    let matcher = CompoundMatcher::new().with_grains(minion_id, grain_args.load()?);

    if matcher.is_member(minion_id, expr)? {
        output::success(&format!("{} matches", minion_id));
    } else {
        output::warn(&format!("{} does not match", minion_id));
    }
    output::kv("filter:", expr);
    Ok(())
}
