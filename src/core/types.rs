//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

/// A minion identifier (e.g., `web01.example.com`).
pub type MinionId = String;

/// A compound filter expression (e.g., `G@role:web and not L@web03`).
pub type FilterExpr = String;

/// A pillar variable name.
///
/// Becomes a top-level key of the compiled pillar.
pub type VariableName = String;

/// Resolved pillar data for one minion, keyed by variable name.
pub type Pillar = BTreeMap<VariableName, serde_json::Value>;
