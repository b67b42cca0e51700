//! Compound resolution
//!
//! A requested compound can arrive as a short identifier (`ac`) or an
//! extended name (`Acetate`). Resolution maps it to the identifier used in
//! the exchange table, then reconstructs a display name by reverse lookup
//! and makes it safe to use in output file names.

use crate::loader::COMPARTMENT_SUFFIX;
use crate::model::CompoundTable;

/// Prefix carried by compound identifiers in the exchange table.
pub const COMPOUND_PREFIX: &str = "M_";

/// Outcome of resolving one requested compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompound {
    /// Short identifier, e.g. `ac`.
    pub short_id: String,
    /// Identifier as it appears in the exchange table, e.g. `M_ac_e`.
    pub compound_id: String,
    /// Sanitized extended name used in reports and file names.
    pub display_name: String,
}

/// Resolve a compound query against the conversion table.
pub fn resolve(query: &str, table: &CompoundTable) -> ResolvedCompound {
    let short_id = table
        .id_for_name(query)
        .unwrap_or(query)
        .to_string();
    let compound_id = format!("{COMPOUND_PREFIX}{short_id}{COMPARTMENT_SUFFIX}");
    let display_name = sanitize_display_name(table.name_for_id(&short_id).unwrap_or(&short_id));
    ResolvedCompound {
        short_id,
        compound_id,
        display_name,
    }
}

/// Replace filesystem-unsafe characters: `:` becomes `-`, the rest are dropped.
pub fn sanitize_display_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            ':' => Some('-'),
            '*' | '?' | '<' | '>' | '|' | '/' | '\\' => None,
            other => Some(other),
        })
        .collect()
}
