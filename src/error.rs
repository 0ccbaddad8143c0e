//! Hard errors. These only occur at the file boundary; everything inside a
//! unit is reported as a [`Diagnostic`](crate::diagnostics::Diagnostic).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
