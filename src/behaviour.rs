//! Species behaviour classification
//!
//! Labels a species' net role for a compound by comparing its average
//! donation probability against its average reception probability. The
//! comparison is epsilon-tolerant; species with means within [`SCORE_EPSILON`]
//! of each other (including the all-zero case) are commensalistic.

use crate::aggregate::{DONATION_AVG_COL, RECEPTION_AVG_COL};
use polars::prelude::*;

pub const BEHAVIOUR_COL: &str = "behaviour";

pub const MAINLY_DONOR: &str = "mainly donor";
pub const MAINLY_RECEIVER: &str = "mainly receiver";
pub const COMMENSALISTIC: &str = "commensalistic";

/// Tolerance below which donation and reception means count as equal.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Classify one species from its per-compound means.
pub fn classify(donation_avg: f64, reception_avg: f64) -> &'static str {
    if (donation_avg - reception_avg).abs() <= SCORE_EPSILON {
        COMMENSALISTIC
    } else if donation_avg > reception_avg {
        MAINLY_DONOR
    } else {
        MAINLY_RECEIVER
    }
}

/// Column expression appending the behaviour label to the species table.
///
/// Expects the donation/reception mean columns to be null-filled already.
pub fn behaviour_expr() -> Expr {
    when(
        col(DONATION_AVG_COL).gt(col(RECEPTION_AVG_COL) + lit(SCORE_EPSILON)),
    )
    .then(lit(MAINLY_DONOR))
    .when(col(RECEPTION_AVG_COL).gt(col(DONATION_AVG_COL) + lit(SCORE_EPSILON)))
    .then(lit(MAINLY_RECEIVER))
    .otherwise(lit(COMMENSALISTIC))
    .alias(BEHAVIOUR_COL)
}
