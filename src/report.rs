//! Report writing
//!
//! All reports are tab-delimited text with a header row, written under a
//! per-run output directory (`outputs/` or `<prefix>_outputs/`). Existing
//! directories only trigger a warning and files are overwritten, so a rerun
//! with identical inputs reproduces identical outputs.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Run-level report file names.
pub const COMPOUNDS_EXCHANGED_FILE: &str = "compounds_exchanged.tsv";
pub const DONORS_FILE: &str = "donors_for_compound.tsv";
pub const RECEIVERS_FILE: &str = "receivers_for_compound.tsv";

/// Creates the output tree and serializes DataFrames into it.
pub struct ReportWriter {
    root: PathBuf,
}

impl ReportWriter {
    /// Create the run-level output directory under `base`.
    pub fn create(base: &Path, prefix: &str) -> Self {
        let dir_name = if prefix.is_empty() {
            "outputs".to_string()
        } else {
            format!("{prefix}_outputs")
        };
        let root = base.join(dir_name);
        if fs::create_dir(&root).is_err() {
            println!(
                "\n<WARNING>: Creation of the directory {} failed. \
                 \nMaybe it already exists, the files inside will be overwritten.",
                root.display()
            );
        }
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create (or reuse, with a warning) the per-compound subdirectory.
    pub fn compound_dir(&self, short_id: &str) -> PathBuf {
        let dir = self.root.join(short_id);
        if dir.exists() {
            println!(
                "\n<WARNING>: Creation of the directory {} failed. \
                 \nMaybe it already exists, the files inside will be overwritten.",
                dir.display()
            );
        } else if let Err(err) = fs::create_dir_all(&dir) {
            println!(
                "\n<ERROR>: Creation of the directory {} failed: {err}.",
                dir.display()
            );
        }
        dir
    }

    /// Write one DataFrame as a tab-delimited file, overwriting any
    /// previous version.
    pub fn write_tsv(&self, path: &Path, df: &DataFrame) -> Result<()> {
        let mut df = df.clone();
        // The CSV writer requires columns with a consistent chunk layout.
        df.rechunk_mut();
        let mut file = fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b'\t')
            .finish(&mut df)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Write an arbitrary text artifact (the rendered HTML network).
    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}
