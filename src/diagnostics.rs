//! Non-fatal findings collected while building a [`SourceUnit`](crate::model::SourceUnit).
//!
//! Nothing in the pipeline aborts on these: a malformed file still yields a
//! (degraded) tree, and the diagnostics travel alongside it.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A comment or string region that could not be tokenized, e.g. an
    /// unterminated triple-quoted string.
    #[error("line {line}: malformed block: {reason}")]
    MalformedBlock { line: usize, reason: String },

    /// A valid block whose target could not be resolved.
    #[error("line {line}: orphaned documentation block{}", describe_target(.target))]
    OrphanedDocBlock { line: usize, target: Option<String> },

    /// Two blocks claimed the same entity; the one at `kept` won.
    #[error("line {dropped}: documentation for `{entity}` superseded by block at line {kept}")]
    DuplicateAssociation {
        entity: String,
        kept: usize,
        dropped: usize,
    },
}

impl Diagnostic {
    /// Line the diagnostic points at.
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::MalformedBlock { line, .. } => *line,
            Diagnostic::OrphanedDocBlock { line, .. } => *line,
            Diagnostic::DuplicateAssociation { dropped, .. } => *dropped,
        }
    }
}

fn describe_target(target: &Option<String>) -> String {
    match target {
        Some(name) => format!(" (no entity named `{}`)", name),
        None => String::new(),
    }
}
