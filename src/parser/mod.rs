//! Parser pipeline: scan, classify, associate, build.
//!
//! [`scan`] splits source text into tokens, [`classify`] turns comment and
//! docstring tokens into [`DocBlock`](crate::model::DocBlock)s, [`associate`]
//! tracks scopes and binds blocks to entity drafts, and [`build`] resolves
//! tag references and assembles the final tree.

pub mod associate;
pub mod build;
pub mod classify;
pub mod scan;

use crate::error::{Error, Result};
use crate::model::SourceUnit;
use crate::options::ScanOptions;
use std::path::Path;

/// Extensions treated as Python source.
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyw", "pyi"];

/// Run the whole pipeline over one source text.
pub fn parse_source(name: &str, input: &str, options: &ScanOptions) -> SourceUnit {
    let tokens = scan::Scanner::new(input, options.tab_width);
    let associations = associate::associate(name, tokens, options);
    build::build(name, associations)
}

/// Parse a source file into a SourceUnit based on its extension.
pub fn parse_file(path: &Path, content: &str, options: &ScanOptions) -> Result<SourceUnit> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if PYTHON_EXTENSIONS.contains(&ext) => {
            Ok(parse_source(&unit_name(path), content, options))
        }
        _ => Err(Error::UnsupportedFile(path.to_path_buf())),
    }
}

/// "pkg/py_doxy.py" → "py_doxy"
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
