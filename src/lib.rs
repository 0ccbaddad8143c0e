//! pydox: extract Doxygen-style `##` comments and docstrings from Python
//! source into a documentation tree.
//!
//! ```no_run
//! use pydox::{parse_source, ScanOptions};
//!
//! let unit = parse_source("shapes", "## A square.\nclass Square:\n    pass\n", &ScanOptions::default());
//! assert_eq!(unit.find("Square").and_then(|e| e.brief()), Some("A square."));
//! ```

pub mod batch;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;

pub use diagnostics::Diagnostic;
pub use error::Error;
pub use model::{CommentStyle, DocBlock, Entity, EntityKind, SourceUnit, Tag, Visibility};
pub use options::ScanOptions;
pub use parser::{parse_file, parse_source};
