//! Input loading and validation
//!
//! Reads the tab-delimited inputs with Polars: the mandatory smetana
//! exchange table plus the optional abundance (coverage) and taxonomy
//! tables. Validation problems in the exchange table abort the run; the
//! optional tables degrade to `None` with a console notice so the pipeline
//! falls back to default abundance/phylum values downstream.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use thiserror::Error;

/// Column names of the smetana exchange table.
pub const COMPOUND_COL: &str = "compound";
pub const DONOR_COL: &str = "donor";
pub const RECEIVER_COL: &str = "receiver";
pub const SCORE_COL: &str = "smetana";

/// Abundance table layout (CheckM coverage output).
pub const BIN_ID_COL: &str = "Bin Id";
pub const ABUNDANCE_COL_SUFFIX: &str = ".sorted: % binned populations";

/// Taxonomy table layout (GTDB-Tk output).
pub const TAXONOMY_ID_COL: &str = "user_genome";
pub const CLASSIFICATION_COL: &str = "NCBI classification";

/// Compartment marker appended to every normalized compound identifier.
pub const COMPARTMENT_SUFFIX: &str = "_e";

/// Validation failures that abort the run when raised on the exchange table.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("The {file} file has {count} missing values. CORRECT IT !!")]
    MissingValues { file: String, count: usize },
    #[error("The {file} file has {count} duplicated rows. CORRECT IT !!")]
    DuplicatedRows { file: String, count: usize },
}

fn read_tsv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn missing_value_count(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

/// Rows that are exact duplicates of an earlier row.
fn duplicated_row_count(df: &DataFrame) -> Result<usize> {
    let mut seen = FxHashSet::default();
    let mut duplicated = 0usize;
    for idx in 0..df.height() {
        let mut key = String::new();
        for column in df.get_columns() {
            let value = column.as_materialized_series().get(idx)?;
            key.push_str(&value.to_string());
            key.push('\u{1}');
        }
        if !seen.insert(key) {
            duplicated += 1;
        }
    }
    Ok(duplicated)
}

/// Truncate a compound identifier at the first compartment marker and
/// reappend the canonical suffix, dropping any extra annotation after it.
pub fn normalize_compound_id(raw: &str) -> String {
    match raw.find(COMPARTMENT_SUFFIX) {
        Some(pos) => format!("{}{}", &raw[..pos], COMPARTMENT_SUFFIX),
        None => format!("{raw}{COMPARTMENT_SUFFIX}"),
    }
}

/// Drop a trailing `.extension` from a species bin identifier, if present.
pub fn normalize_species_id(raw: &str) -> String {
    match raw.rfind('.') {
        Some(pos) => raw[..pos].to_string(),
        None => raw.to_string(),
    }
}

/// Load and validate the mandatory exchange table.
///
/// Aborts with [`ValidationError`] on missing cells or duplicated rows,
/// then normalizes the compound column.
pub fn load_exchanges(path: &Path) -> Result<DataFrame> {
    let mut df = read_tsv(path)?;

    for required in [COMPOUND_COL, DONOR_COL, RECEIVER_COL, SCORE_COL] {
        df.column(required)
            .with_context(|| format!("smetana file is missing the '{required}' column"))?;
    }

    let missing = missing_value_count(&df);
    if missing > 0 {
        return Err(ValidationError::MissingValues {
            file: "smetana".to_string(),
            count: missing,
        }
        .into());
    }

    let duplicated = duplicated_row_count(&df)?;
    if duplicated > 0 {
        return Err(ValidationError::DuplicatedRows {
            file: "smetana".to_string(),
            count: duplicated,
        }
        .into());
    }

    let normalized: StringChunked = df
        .column(COMPOUND_COL)?
        .str()?
        .into_iter()
        .map(|opt| opt.map(normalize_compound_id))
        .collect();
    let mut series = normalized.into_series();
    series.rename(COMPOUND_COL.into());
    df.with_column(series)?;

    // Scores must be numeric for downstream means.
    let scores = df
        .column(SCORE_COL)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .context("smetana column is not numeric")?;
    df.with_column(scores)?;

    Ok(df)
}

/// Per-species relative abundance, already scaled ×100.
pub type AbundanceMap = FxHashMap<String, f64>;

/// Per-species phylum extracted from the classification string.
pub type TaxonomyMap = FxHashMap<String, String>;

/// Load the optional abundance table; any failure degrades to `None`.
pub fn load_abundance(path: Option<&Path>) -> Option<AbundanceMap> {
    let loaded = path.map(try_load_abundance);
    match loaded {
        Some(Ok(map)) => Some(map),
        Some(Err(err)) => {
            println!(
                "\nATTENTION: The MAGs coverage file could not be used ({err:#}). \
                 No abundances info will be added to the graph."
            );
            None
        }
        None => {
            println!(
                "\nATTENTION: The MAGs coverage file has not been selected. \
                 No abundances info will be added to the graph."
            );
            None
        }
    }
}

fn try_load_abundance(path: &Path) -> Result<AbundanceMap> {
    let df = read_tsv(path)?;

    df.column(BIN_ID_COL)
        .with_context(|| format!("coverage file is missing the '{BIN_ID_COL}' column"))?;

    let missing = missing_value_count(&df);
    if missing > 0 {
        bail!(ValidationError::MissingValues {
            file: "MAGs coverage".to_string(),
            count: missing,
        });
    }
    let duplicated = duplicated_row_count(&df)?;
    if duplicated > 0 {
        bail!(ValidationError::DuplicatedRows {
            file: "MAGs coverage".to_string(),
            count: duplicated,
        });
    }

    let mut abundance_columns = Vec::new();
    for column in df.get_columns() {
        if column.name().ends_with(ABUNDANCE_COL_SUFFIX) {
            abundance_columns.push(
                column
                    .as_materialized_series()
                    .cast(&DataType::Float64)
                    .with_context(|| format!("column '{}' is not numeric", column.name()))?,
            );
        }
    }
    if abundance_columns.is_empty() {
        bail!("no column ending with '{ABUNDANCE_COL_SUFFIX}' found");
    }

    let bins = df.column(BIN_ID_COL)?.str()?;
    let mut map = AbundanceMap::default();
    for idx in 0..df.height() {
        let Some(bin) = bins.get(idx) else { continue };
        let values: Vec<f64> = abundance_columns
            .iter()
            .filter_map(|s| s.f64().ok().and_then(|ca| ca.get(idx)))
            .collect();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        map.insert(normalize_species_id(bin), mean * 100.0);
    }
    Ok(map)
}

/// Load the optional taxonomy table; any failure degrades to `None`.
pub fn load_taxonomy(path: Option<&Path>) -> Option<TaxonomyMap> {
    let loaded = path.map(try_load_taxonomy);
    match loaded {
        Some(Ok(map)) => Some(map),
        Some(Err(err)) => {
            println!(
                "\nATTENTION: The MAGs taxonomy file could not be used ({err:#}). \
                 No taxonomy info will be added to the graph."
            );
            None
        }
        None => {
            println!(
                "\nATTENTION: The MAGs taxonomy file has not been selected. \
                 No taxonomy info will be added to the graph."
            );
            None
        }
    }
}

fn try_load_taxonomy(path: &Path) -> Result<TaxonomyMap> {
    let df = read_tsv(path)?;

    let missing = missing_value_count(&df);
    if missing > 0 {
        bail!(ValidationError::MissingValues {
            file: "taxonomy".to_string(),
            count: missing,
        });
    }

    let genomes = df
        .column(TAXONOMY_ID_COL)
        .with_context(|| format!("taxonomy file is missing the '{TAXONOMY_ID_COL}' column"))?
        .str()?;
    let classifications = df
        .column(CLASSIFICATION_COL)
        .with_context(|| format!("taxonomy file is missing the '{CLASSIFICATION_COL}' column"))?
        .str()?;

    // Duplicate check is by species identifier only, not the full row.
    let mut seen = FxHashSet::default();
    let mut duplicated = 0usize;
    for genome in genomes.into_iter().flatten() {
        if !seen.insert(genome.to_string()) {
            duplicated += 1;
        }
    }
    if duplicated > 0 {
        bail!(ValidationError::DuplicatedRows {
            file: "taxonomy".to_string(),
            count: duplicated,
        });
    }

    let mut map = TaxonomyMap::default();
    for (genome, classification) in genomes.into_iter().zip(classifications) {
        let (Some(genome), Some(classification)) = (genome, classification) else {
            continue;
        };
        if let Some(phylum) = extract_phylum(classification) {
            map.insert(normalize_species_id(genome), phylum);
        }
    }
    Ok(map)
}

/// Second field of a semicolon-delimited classification, `p__` prefix stripped.
fn extract_phylum(classification: &str) -> Option<String> {
    classification
        .split(';')
        .nth(1)
        .map(|field| field.strip_prefix("p__").unwrap_or(field).to_string())
}
