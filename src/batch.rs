//! Parallel processing of independent units.

use crate::error::Error;
use crate::model::SourceUnit;
use crate::options::ScanOptions;
use crate::parser;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-memory source with the name its unit is built under.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub name: String,
    pub text: String,
}

/// Parse every input on the rayon pool. Output order follows input order.
pub fn parse_all(inputs: &[SourceInput], options: &ScanOptions) -> Vec<SourceUnit> {
    inputs
        .par_iter()
        .map(|input| parser::parse_source(&input.name, &input.text, options))
        .collect()
}

/// Read and parse files in parallel. Files that cannot be read or are not
/// Python sources are skipped with a warning.
pub fn parse_paths(paths: &[PathBuf], options: &ScanOptions) -> Vec<(PathBuf, SourceUnit)> {
    paths
        .par_iter()
        .filter_map(|path| match load(path, options) {
            Ok(unit) => {
                debug!(path = %path.display(), diagnostics = unit.diagnostics().len(), "parsed");
                Some((path.clone(), unit))
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn load(path: &Path, options: &ScanOptions) -> Result<SourceUnit, Error> {
    let content = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parser::parse_file(path, &content, options)
}
