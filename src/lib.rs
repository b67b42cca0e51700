//! NEMETEX: network-based metabolic exchange analysis
//!
//! Computes and reports metabolic-exchange statistics between the species of
//! a simulated microbial community, from the tabular output of a
//! metabolic-interaction simulator (smetana) plus optional abundance and
//! taxonomy tables.
//!
//! Pipeline: `loader` validates the inputs once, `aggregate` precomputes the
//! run-level statistics, then for each requested compound `resolve` →
//! `extract` → `behaviour` → `report` + `render` produce the per-compound
//! artifacts. Everything is sequential and in-memory; the full exchange
//! table is small.

pub mod aggregate;
pub mod behaviour;
pub mod extract;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod resolve;

// Re-export commonly used types
pub use aggregate::ExchangeAggregates;
pub use extract::CompoundExchanges;
pub use model::{CompoundTable, ModelKind};
pub use pipeline::{CompoundOutcome, RunContext};
pub use report::ReportWriter;
pub use resolve::ResolvedCompound;
