//! Model-toolchain selection and compound conversion tables
//!
//! Exchange tables encode compounds with short identifiers specific to the
//! upstream modeling toolchain (BiGG codes for CarveMe models, ModelSEED
//! codes for gapseq models). The bundled conversion tables map human-readable
//! extended names to those identifiers; both directions are needed because
//! reports show extended names while the exchange table keys on identifiers.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rustc_hash::FxHashMap;

/// Toolchain used to generate the metabolic models behind the exchange table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// CarveMe models (BiGG compound identifiers)
    #[value(name = "CarveMe")]
    CarveMe,
    /// gapseq models (ModelSEED compound identifiers)
    #[value(name = "gapseq")]
    Gapseq,
}

// Bundled reference data, pre-validated (no missing or duplicate entries).
const BIGG_TABLE: &str = include_str!("../data/bigg_compounds_conversion_table.txt");
const GAPSEQ_TABLE: &str = include_str!("../data/gapseq_compounds_conversion_table.txt");

impl ModelKind {
    /// Reference database where valid compound names can be looked up.
    pub fn reference_url(&self) -> &'static str {
        match self {
            ModelKind::CarveMe => "http://bigg.ucsd.edu/universal/metabolites",
            ModelKind::Gapseq => "https://modelseed.org/biochem/compounds",
        }
    }

    fn table_source(&self) -> &'static str {
        match self {
            ModelKind::CarveMe => BIGG_TABLE,
            ModelKind::Gapseq => GAPSEQ_TABLE,
        }
    }
}

/// Bidirectional extended-name ↔ short-identifier lookup.
pub struct CompoundTable {
    name_to_id: FxHashMap<String, String>,
    id_to_name: FxHashMap<String, String>,
}

impl CompoundTable {
    /// Load the conversion table bundled for the given toolchain.
    pub fn bundled(model: ModelKind) -> Result<Self> {
        Self::parse(model.table_source())
    }

    fn parse(source: &str) -> Result<Self> {
        let mut lines = source.lines();
        lines.next().context("conversion table is empty")?;

        let mut name_to_id = FxHashMap::default();
        let mut id_to_name = FxHashMap::default();

        for (lineno, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let (name, id) = line
                .split_once('\t')
                .with_context(|| format!("conversion table line {} is malformed", lineno + 2))?;
            name_to_id.insert(name.to_string(), id.to_string());
            id_to_name.insert(id.to_string(), name.to_string());
        }

        Ok(Self {
            name_to_id,
            id_to_name,
        })
    }

    /// Short identifier for an extended compound name. Case sensitive.
    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(String::as_str)
    }

    /// Extended compound name for a short identifier.
    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_tables_load() {
        let bigg = CompoundTable::bundled(ModelKind::CarveMe).unwrap();
        assert!(!bigg.is_empty());
        assert_eq!(bigg.id_for_name("Acetate"), Some("ac"));
        assert_eq!(bigg.name_for_id("ac"), Some("Acetate"));

        let seed = CompoundTable::bundled(ModelKind::Gapseq).unwrap();
        assert_eq!(seed.id_for_name("Acetate"), Some("cpd00029"));
        assert_eq!(seed.name_for_id("cpd00029"), Some("Acetate"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let bigg = CompoundTable::bundled(ModelKind::CarveMe).unwrap();
        assert_eq!(bigg.id_for_name("acetate"), None);
    }

    #[test]
    fn reference_urls_differ_per_toolchain() {
        assert_ne!(
            ModelKind::CarveMe.reference_url(),
            ModelKind::Gapseq.reference_url()
        );
    }
}
