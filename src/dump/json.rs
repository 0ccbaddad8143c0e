//! JSON dumper: the serde view of the model, for tooling.

use crate::dump::Dumper;
use crate::model::SourceUnit;
use anyhow::{Context, Result};

pub struct JsonDumper;

impl Dumper for JsonDumper {
    fn dump(&self, unit: &SourceUnit) -> Result<String> {
        let mut out = serde_json::to_string_pretty(unit)
            .with_context(|| format!("failed to serialize unit {}", unit.name()))?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
