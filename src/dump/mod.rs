//! Dumpers: trait-based output format dispatch for the inspection binary.

pub mod json;
pub mod outline;

use crate::model::SourceUnit;
use anyhow::{anyhow, Result};

/// Trait for turning a SourceUnit into a specific output format.
pub trait Dumper {
    fn dump(&self, unit: &SourceUnit) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a dumper for the given format name.
pub fn create_dumper(format: &str) -> Result<Box<dyn Dumper>> {
    match format {
        "json" => Ok(Box::new(json::JsonDumper)),
        "outline" | "txt" => Ok(Box::new(outline::OutlineDumper)),
        _ => Err(anyhow!("unknown format: {}. Use json or outline", format)),
    }
}
