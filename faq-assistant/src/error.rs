//! Typed error for the faq-assistant crate.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons the FAQ file could not be loaded.
///
/// Only surfaced by [`crate::store::FaqStore::try_load`]; the startup path
/// uses [`crate::store::FaqStore::load`], which logs and falls back to an
/// empty store.
#[derive(Debug, Error)]
pub enum FaqLoadError {
    /// File missing or unreadable.
    #[error("cannot read FAQ file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not the expected `{"faqs": [...]}` JSON.
    #[error("invalid FAQ JSON: {0}")]
    Json(#[from] serde_json::Error),
}
