//! Whole-table exchange aggregates
//!
//! Computed once per run from the validated exchange table and read-only
//! afterwards: per-compound totals plus per-(compound, donor) and
//! per-(compound, receiver) breakdowns. Partner counts are distinct counts.

use crate::loader::{COMPOUND_COL, DONOR_COL, RECEIVER_COL, SCORE_COL};
use anyhow::Result;
use polars::prelude::*;

/// Report column names (kept as in the written TSV headers).
pub const EXCHANGE_COUNT_COL: &str = "number of exchanges";
pub const SCORE_AVG_COL: &str = "smetana_avg";
pub const GIVES_TO_COL: &str = "gives to";
pub const DONATION_AVG_COL: &str = "average probability of donation";
pub const RECEIVES_FROM_COL: &str = "receives from";
pub const RECEPTION_AVG_COL: &str = "average probability to receive";

/// The three run-level aggregates of the exchange table.
pub struct ExchangeAggregates {
    /// compound | number of exchanges | smetana_avg (sorted by compound)
    pub compounds: DataFrame,
    /// compound | donor | gives to | average probability of donation
    pub donors: DataFrame,
    /// compound | receiver | receives from | average probability to receive
    pub receivers: DataFrame,
}

impl ExchangeAggregates {
    pub fn compute(exchanges: &DataFrame) -> Result<Self> {
        let compounds = exchanges
            .clone()
            .lazy()
            .group_by([col(COMPOUND_COL)])
            .agg([
                len().alias(EXCHANGE_COUNT_COL),
                col(SCORE_COL).mean().alias(SCORE_AVG_COL),
            ])
            .sort([COMPOUND_COL], SortMultipleOptions::default())
            .collect()?;

        let donors = exchanges
            .clone()
            .lazy()
            .group_by([col(COMPOUND_COL), col(DONOR_COL)])
            .agg([
                col(RECEIVER_COL).n_unique().alias(GIVES_TO_COL),
                col(SCORE_COL).mean().alias(DONATION_AVG_COL),
            ])
            .sort([COMPOUND_COL, DONOR_COL], SortMultipleOptions::default())
            .collect()?;

        let receivers = exchanges
            .clone()
            .lazy()
            .group_by([col(COMPOUND_COL), col(RECEIVER_COL)])
            .agg([
                col(DONOR_COL).n_unique().alias(RECEIVES_FROM_COL),
                col(SCORE_COL).mean().alias(RECEPTION_AVG_COL),
            ])
            .sort(
                [COMPOUND_COL, RECEIVER_COL],
                SortMultipleOptions::default(),
            )
            .collect()?;

        Ok(Self {
            compounds,
            donors,
            receivers,
        })
    }

    /// Number of distinct compounds exchanged in the community.
    pub fn compound_count(&self) -> usize {
        self.compounds.height()
    }

    /// Whether the given normalized compound identifier has any exchanges.
    pub fn contains_compound(&self, compound_id: &str) -> Result<bool> {
        let compounds = self.compounds.column(COMPOUND_COL)?.str()?;
        Ok(compounds.into_iter().flatten().any(|c| c == compound_id))
    }

    /// Donation stats for one compound, keyed by species.
    pub fn donors_for(&self, compound_id: &str) -> LazyFrame {
        self.donors
            .clone()
            .lazy()
            .filter(col(COMPOUND_COL).eq(lit(compound_id)))
            .select([
                col(DONOR_COL).alias("Species"),
                col(GIVES_TO_COL),
                col(DONATION_AVG_COL),
            ])
    }

    /// Reception stats for one compound, keyed by species.
    pub fn receivers_for(&self, compound_id: &str) -> LazyFrame {
        self.receivers
            .clone()
            .lazy()
            .filter(col(COMPOUND_COL).eq(lit(compound_id)))
            .select([
                col(RECEIVER_COL).alias("Species"),
                col(RECEIVES_FROM_COL),
                col(RECEPTION_AVG_COL),
            ])
    }
}
