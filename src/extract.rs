//! Per-compound exchange extraction
//!
//! Filters the exchange table to one resolved compound, gathers the species
//! involved with their abundance and phylum, and builds the directed
//! exchange graph. Parallel rows between the same donor/receiver pair are
//! aggregated into a single edge carrying the mean score; the raw subset
//! keeps every row for the report.

use crate::loader::{AbundanceMap, TaxonomyMap, COMPOUND_COL, DONOR_COL, RECEIVER_COL, SCORE_COL};
use anyhow::Result;
use petgraph::graph::DiGraph;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Phylum shown when no taxonomy information is available for a species.
pub const UNKNOWN_PHYLUM: &str = "Unknown";

/// Node payload: one species in the exchange network.
#[derive(Debug, Clone)]
pub struct SpeciesNode {
    pub id: String,
    /// Relative abundance on the 0-100 scale (0 when unavailable).
    pub size: f64,
    /// Phylum, used as the visual grouping attribute.
    pub group: String,
}

/// Edge payload: a donor→receiver transfer with its exchange score.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeEdge {
    pub value: f64,
}

/// Everything derived for one queried compound.
pub struct CompoundExchanges {
    /// Raw filtered exchange rows, one per original table row.
    pub subset: DataFrame,
    /// Species appearing as donor or receiver, sorted, each once.
    pub species: Vec<String>,
    /// Directed graph with species nodes and donor→receiver edges.
    pub graph: DiGraph<SpeciesNode, ExchangeEdge>,
}

impl CompoundExchanges {
    /// Number of exchange rows for this compound.
    pub fn exchange_count(&self) -> usize {
        self.subset.height()
    }
}

/// Extract the exchanges of `compound_id` and build the species graph.
pub fn extract(
    exchanges: &DataFrame,
    compound_id: &str,
    abundance: Option<&AbundanceMap>,
    taxonomy: Option<&TaxonomyMap>,
) -> Result<CompoundExchanges> {
    let mask: BooleanChunked = exchanges
        .column(COMPOUND_COL)?
        .str()?
        .into_iter()
        .map(|opt| opt == Some(compound_id))
        .collect();
    let subset = exchanges.filter(&mask)?;

    let donors = subset.column(DONOR_COL)?.str()?;
    let receivers = subset.column(RECEIVER_COL)?.str()?;
    let scores = subset.column(SCORE_COL)?.f64()?;

    let mut species_set = BTreeSet::new();
    for name in donors.into_iter().chain(receivers).flatten() {
        species_set.insert(name.to_string());
    }
    let species: Vec<String> = species_set.into_iter().collect();

    let mut graph = DiGraph::new();
    let mut node_index = FxHashMap::default();
    for id in &species {
        let size = abundance
            .and_then(|map| map.get(id))
            .copied()
            .unwrap_or(0.0);
        let group = taxonomy
            .and_then(|map| map.get(id))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PHYLUM.to_string());
        let idx = graph.add_node(SpeciesNode {
            id: id.clone(),
            size,
            group,
        });
        node_index.insert(id.clone(), idx);
    }

    // Aggregate parallel donor→receiver rows by mean score. BTreeMap keeps
    // edge insertion order deterministic across runs.
    let mut pair_scores: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for idx in 0..subset.height() {
        let (Some(donor), Some(receiver), Some(score)) =
            (donors.get(idx), receivers.get(idx), scores.get(idx))
        else {
            continue;
        };
        let entry = pair_scores
            .entry((donor.to_string(), receiver.to_string()))
            .or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }
    for ((donor, receiver), (sum, count)) in pair_scores {
        graph.add_edge(
            node_index[&donor],
            node_index[&receiver],
            ExchangeEdge {
                value: sum / count as f64,
            },
        );
    }

    Ok(CompoundExchanges {
        subset,
        species,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use petgraph::visit::EdgeRef;

    fn sample() -> DataFrame {
        df!(
            COMPOUND_COL => ["M_ac_e", "M_ac_e", "M_ac_e", "M_glc__D_e"],
            DONOR_COL => ["A", "A", "A", "B"],
            RECEIVER_COL => ["B", "C", "B", "A"],
            SCORE_COL => [0.8, 0.6, 0.4, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn filters_to_compound_and_collects_species_once() {
        let extracted = extract(&sample(), "M_ac_e", None, None).unwrap();
        assert_eq!(extracted.exchange_count(), 3);
        assert_eq!(extracted.species, vec!["A", "B", "C"]);
    }

    #[test]
    fn parallel_edges_aggregate_by_mean() {
        let extracted = extract(&sample(), "M_ac_e", None, None).unwrap();
        // A→B appears twice (0.8, 0.4) and collapses to one edge of 0.6.
        assert_eq!(extracted.graph.edge_count(), 2);
        let mut a_to_b = None;
        for edge in extracted.graph.edge_references() {
            let from = &extracted.graph[edge.source()];
            let to = &extracted.graph[edge.target()];
            if from.id == "A" && to.id == "B" {
                a_to_b = Some(edge.weight().value);
            }
        }
        assert_relative_eq!(a_to_b.unwrap(), 0.6);
    }

    #[test]
    fn missing_side_tables_default_attributes() {
        let extracted = extract(&sample(), "M_ac_e", None, None).unwrap();
        for node in extracted.graph.node_weights() {
            assert_eq!(node.size, 0.0);
            assert_eq!(node.group, UNKNOWN_PHYLUM);
        }
    }

    #[test]
    fn side_tables_enrich_nodes() {
        let mut abundance = AbundanceMap::default();
        abundance.insert("A".to_string(), 42.0);
        let mut taxonomy = TaxonomyMap::default();
        taxonomy.insert("A".to_string(), "Firmicutes".to_string());

        let extracted =
            extract(&sample(), "M_ac_e", Some(&abundance), Some(&taxonomy)).unwrap();
        let a = extracted
            .graph
            .node_weights()
            .find(|n| n.id == "A")
            .unwrap();
        assert_relative_eq!(a.size, 42.0);
        assert_eq!(a.group, "Firmicutes");

        let b = extracted
            .graph
            .node_weights()
            .find(|n| n.id == "B")
            .unwrap();
        assert_eq!(b.size, 0.0);
        assert_eq!(b.group, UNKNOWN_PHYLUM);
    }

    #[test]
    fn absent_compound_yields_empty_subset() {
        let extracted = extract(&sample(), "M_succ_e", None, None).unwrap();
        assert_eq!(extracted.exchange_count(), 0);
        assert!(extracted.species.is_empty());
        assert_eq!(extracted.graph.node_count(), 0);
    }
}
