//! Host membership.
//!
//! The resolver asks a [`HostMatcher`] whether the minion being compiled
//! belongs to a filter. [`CompoundMatcher`] evaluates compound filter
//! expressions against the minion id and its grains.

use crate::error::MatchError;

mod compound;

pub use compound::{CompoundMatcher, Expr, Grains};

/// Decides whether a minion is targeted by a filter expression.
pub trait HostMatcher {
    /// Check whether `minion_id` matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError` if the filter can't be parsed.
    fn is_member(&self, minion_id: &str, filter: &str) -> Result<bool, MatchError>;
}

impl<T: HostMatcher + ?Sized> HostMatcher for &T {
    fn is_member(&self, minion_id: &str, filter: &str) -> Result<bool, MatchError> {
        (**self).is_member(minion_id, filter)
    }
}
