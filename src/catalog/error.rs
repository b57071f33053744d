use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("corrupt catalog at line {line}: {content:?}")]
    CorruptCatalog { line: usize, content: String },
    #[error("invalid element set for {name}: {message}")]
    InvalidElements { name: String, message: String },
    #[error("invalid observer position in {path}: {content:?}")]
    InvalidObserver { path: PathBuf, content: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
