//! Per-compound pipeline orchestration
//!
//! Holds the run-wide state (validated exchange table, precomputed
//! aggregates, conversion table, optional enrichment maps, report writer)
//! and drives resolve → extract → classify → write → render for each
//! requested compound. Per-compound and per-artifact failures are reported
//! and never abort the rest of the run.

use crate::aggregate::{
    ExchangeAggregates, DONATION_AVG_COL, GIVES_TO_COL, RECEPTION_AVG_COL, RECEIVES_FROM_COL,
};
use crate::behaviour::behaviour_expr;
use crate::extract::{extract, CompoundExchanges};
use crate::loader::{AbundanceMap, TaxonomyMap};
use crate::model::{CompoundTable, ModelKind};
use crate::render::render_network;
use crate::report::{
    ReportWriter, COMPOUNDS_EXCHANGED_FILE, DONORS_FILE, RECEIVERS_FILE,
};
use crate::resolve::{resolve, ResolvedCompound};
use anyhow::Result;
use polars::prelude::*;

/// What happened to one requested compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOutcome {
    /// Reports and network were produced.
    Processed,
    /// The compound has no exchanges in the community.
    Skipped,
}

/// Run-wide state shared across all requested compounds.
pub struct RunContext {
    pub model: ModelKind,
    pub exchanges: DataFrame,
    pub aggregates: ExchangeAggregates,
    pub compound_table: CompoundTable,
    pub abundance: Option<AbundanceMap>,
    pub taxonomy: Option<TaxonomyMap>,
    pub writer: ReportWriter,
}

impl RunContext {
    /// Write the three run-level aggregate reports. Each failure is
    /// reported for that artifact only.
    pub fn write_run_reports(&self) {
        let root = self.writer.root();

        match self
            .writer
            .write_tsv(&root.join(COMPOUNDS_EXCHANGED_FILE), &self.aggregates.compounds)
        {
            Ok(()) => println!(
                "\n...In the community there are {} exchanges of {} different compounds.\
                 \n\nThe file with the list of all compounds exchanged in the community \
                 has been generated...",
                self.exchanges.height(),
                self.aggregates.compound_count()
            ),
            Err(_) => println!("\n<ERROR>: Creation of the compounds_exchanged file failed."),
        }

        match self
            .writer
            .write_tsv(&root.join(DONORS_FILE), &self.aggregates.donors)
        {
            Ok(()) => println!("The file with the list of all donors for each compound has been generated..."),
            Err(_) => println!("\n<ERROR>: Creation of the donors_for_compound file failed."),
        }

        match self
            .writer
            .write_tsv(&root.join(RECEIVERS_FILE), &self.aggregates.receivers)
        {
            Ok(()) => println!(
                "The file with the list of all receivers for each compound has been generated...\
                 \n\nSee inside {} folder.\n",
                root.display()
            ),
            Err(_) => println!("\n<ERROR>: Creation of the receivers_for_compound file failed."),
        }
    }

    /// Run the full per-compound pipeline for one requested compound.
    pub fn process_compound(&self, query: &str) -> Result<CompoundOutcome> {
        let resolved = resolve(query, &self.compound_table);

        if !self.aggregates.contains_compound(&resolved.compound_id)? {
            println!(
                "\nATTENTION: There are not {} exchanges in the community, check the name \
                 inside the database ({}) or try another compound. \
                 Remember, compound names are Case Sensitive.\n",
                resolved.short_id,
                self.model.reference_url()
            );
            return Ok(CompoundOutcome::Skipped);
        }

        println!(
            "\n\nYou are searching for all {} exchanges in the community...",
            resolved.display_name.to_uppercase()
        );

        let extracted = extract(
            &self.exchanges,
            &resolved.compound_id,
            self.abundance.as_ref(),
            self.taxonomy.as_ref(),
        )?;
        println!(
            "\n...There are {} exchange(s) of {} in the community.",
            extracted.exchange_count(),
            resolved.display_name.to_uppercase()
        );

        let dir = self.writer.compound_dir(&resolved.short_id);

        let subset_path = dir.join(format!("{}_exchanges.tsv", resolved.display_name));
        match self.writer.write_tsv(&subset_path, &extracted.subset) {
            Ok(()) => println!(
                "\nThe file with all {} exchanges in the community has been generated...",
                resolved.display_name
            ),
            Err(_) => println!("\n<ERROR>: Creation of the compound file failed"),
        }

        let html_path = dir.join(format!("{}_exchanges.html", resolved.display_name));
        match render_network(&extracted, &resolved.display_name)
            .and_then(|html| self.writer.write_text(&html_path, &html))
        {
            Ok(()) => println!(
                "The HTML file with the network of all {} exchanges in the community \
                 has been generated...",
                resolved.display_name
            ),
            Err(_) => println!("<ERROR>: Creation of the network's HTML file failed"),
        }

        let behaviour_path = dir.join(format!("{}_species_behaviour.tsv", resolved.display_name));
        match self
            .species_behaviour(&extracted, &resolved)
            .and_then(|df| self.writer.write_tsv(&behaviour_path, &df))
        {
            Ok(()) => println!(
                "The file with characteristics of all species involved in {} exchanges \
                 has been generated.\n\nSee inside {} folder.\n",
                resolved.display_name,
                dir.display()
            ),
            Err(_) => println!("\n<ERROR>: Creation of the species behaviours file failed"),
        }

        Ok(CompoundOutcome::Processed)
    }

    /// Combined species table: abundance and phylum joined with the
    /// per-compound donation/reception stats, behaviour label appended.
    fn species_behaviour(
        &self,
        extracted: &CompoundExchanges,
        resolved: &ResolvedCompound,
    ) -> Result<DataFrame> {
        let abundances: Vec<f64> = extracted
            .species
            .iter()
            .map(|s| {
                self.abundance
                    .as_ref()
                    .and_then(|map| map.get(s))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        let phyla: Vec<String> = extracted
            .species
            .iter()
            .map(|s| {
                self.taxonomy
                    .as_ref()
                    .and_then(|map| map.get(s))
                    .cloned()
                    .unwrap_or_else(|| crate::extract::UNKNOWN_PHYLUM.to_string())
            })
            .collect();

        let species_df = df!(
            "Species" => &extracted.species,
            "abundance" => abundances,
            "taxonomy" => phyla,
        )?;

        let donors = self.aggregates.donors_for(&resolved.compound_id);
        let receivers = self.aggregates.receivers_for(&resolved.compound_id);

        let combined = species_df
            .lazy()
            .join(
                donors,
                [col("Species")],
                [col("Species")],
                JoinArgs::new(JoinType::Left),
            )
            .join(
                receivers,
                [col("Species")],
                [col("Species")],
                JoinArgs::new(JoinType::Left),
            )
            .with_columns([
                col(GIVES_TO_COL).fill_null(lit(0)),
                col(DONATION_AVG_COL).fill_null(lit(0.0)),
                col(RECEIVES_FROM_COL).fill_null(lit(0)),
                col(RECEPTION_AVG_COL).fill_null(lit(0.0)),
            ])
            // Rescale from the 0-100 display scale to 0-1.
            .with_column((col("abundance") / lit(100.0)).alias("abundance"))
            .with_column(behaviour_expr())
            .sort(
                ["abundance"],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?;

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::{BEHAVIOUR_COL, COMMENSALISTIC, MAINLY_DONOR, MAINLY_RECEIVER};
    use crate::loader::{COMPOUND_COL, DONOR_COL, RECEIVER_COL, SCORE_COL};

    fn context(base: &std::path::Path) -> RunContext {
        let exchanges = df!(
            COMPOUND_COL => ["M_ac_e", "M_ac_e", "M_glc__D_e"],
            DONOR_COL => ["A", "A", "B"],
            RECEIVER_COL => ["B", "C", "A"],
            SCORE_COL => [0.8, 0.6, 0.5],
        )
        .unwrap();
        let aggregates = ExchangeAggregates::compute(&exchanges).unwrap();
        RunContext {
            model: ModelKind::CarveMe,
            exchanges,
            aggregates,
            compound_table: CompoundTable::bundled(ModelKind::CarveMe).unwrap(),
            abundance: None,
            taxonomy: None,
            writer: ReportWriter::create(base, ""),
        }
    }

    #[test]
    fn absent_compound_is_skipped_without_files() {
        let base = tempfile::tempdir().unwrap();
        let ctx = context(base.path());
        let outcome = ctx.process_compound("Succinate").unwrap();
        assert_eq!(outcome, CompoundOutcome::Skipped);
        assert!(!ctx.writer.root().join("succ").exists());
    }

    #[test]
    fn processed_compound_writes_all_artifacts() {
        let base = tempfile::tempdir().unwrap();
        let ctx = context(base.path());
        let outcome = ctx.process_compound("Acetate").unwrap();
        assert_eq!(outcome, CompoundOutcome::Processed);

        let dir = ctx.writer.root().join("ac");
        assert!(dir.join("Acetate_exchanges.tsv").is_file());
        assert!(dir.join("Acetate_exchanges.html").is_file());
        assert!(dir.join("Acetate_species_behaviour.tsv").is_file());
    }

    #[test]
    fn behaviour_table_labels_each_species_once() {
        let base = tempfile::tempdir().unwrap();
        let ctx = context(base.path());
        let resolved = resolve("Acetate", &ctx.compound_table);
        let extracted = extract(&ctx.exchanges, &resolved.compound_id, None, None).unwrap();
        let table = ctx.species_behaviour(&extracted, &resolved).unwrap();

        assert_eq!(table.height(), 3);
        let species = table.column("Species").unwrap().str().unwrap();
        let labels = table.column(BEHAVIOUR_COL).unwrap().str().unwrap();
        for idx in 0..table.height() {
            let label = labels.get(idx).unwrap();
            match species.get(idx).unwrap() {
                // A only donates acetate, B and C only receive it.
                "A" => assert_eq!(label, MAINLY_DONOR),
                _ => assert_eq!(label, MAINLY_RECEIVER),
            }
        }
    }

    #[test]
    fn species_without_exchange_roles_default_to_zero() {
        // B receives glucose but never touches acetate donation stats;
        // with no abundance data every mean defaults through fill_null.
        let base = tempfile::tempdir().unwrap();
        let ctx = context(base.path());
        let resolved = resolve("D-Glucose", &ctx.compound_table);
        let extracted = extract(&ctx.exchanges, &resolved.compound_id, None, None).unwrap();
        let table = ctx.species_behaviour(&extracted, &resolved).unwrap();

        assert_eq!(table.height(), 2);
        let labels = table.column(BEHAVIOUR_COL).unwrap().str().unwrap();
        let species = table.column("Species").unwrap().str().unwrap();
        for idx in 0..table.height() {
            match species.get(idx).unwrap() {
                "B" => assert_eq!(labels.get(idx).unwrap(), MAINLY_DONOR),
                "A" => assert_eq!(labels.get(idx).unwrap(), MAINLY_RECEIVER),
                other => panic!("unexpected species {other}"),
            }
        }
    }

    #[test]
    fn commensalistic_when_means_match() {
        let base = tempfile::tempdir().unwrap();
        let exchanges = df!(
            COMPOUND_COL => ["M_ac_e", "M_ac_e"],
            DONOR_COL => ["A", "B"],
            RECEIVER_COL => ["B", "A"],
            SCORE_COL => [0.5, 0.5],
        )
        .unwrap();
        let aggregates = ExchangeAggregates::compute(&exchanges).unwrap();
        let ctx = RunContext {
            model: ModelKind::CarveMe,
            exchanges,
            aggregates,
            compound_table: CompoundTable::bundled(ModelKind::CarveMe).unwrap(),
            abundance: None,
            taxonomy: None,
            writer: ReportWriter::create(base.path(), ""),
        };
        let resolved = resolve("ac", &ctx.compound_table);
        let extracted = extract(&ctx.exchanges, &resolved.compound_id, None, None).unwrap();
        let table = ctx.species_behaviour(&extracted, &resolved).unwrap();

        let labels = table.column(BEHAVIOUR_COL).unwrap().str().unwrap();
        for idx in 0..table.height() {
            assert_eq!(labels.get(idx).unwrap(), COMMENSALISTIC);
        }
    }
}
