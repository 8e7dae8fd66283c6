//! digiquery - structured search-query compiler for a photo library database.
//!
//! This library reads the serialized search query language, compiles it to a
//! parameterized SQL WHERE fragment plus row-level post-filters, and converts
//! legacy URL-encoded searches into the serialized form.

pub mod config;
pub mod db;
pub mod geodetic;
pub mod query;
pub mod searchxml;

use thiserror::Error;

pub use config::BuilderConfig;
pub use query::{CompiledQuery, ImageQueryBuilder};

/// Error types covering all failure modes outside the compiler itself.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Malformed serialized query or writer failure
    #[error("XML error: {0}")]
    Xml(String),

    /// Legacy search URL that cannot be parsed
    #[error("URL error: {0}")]
    Url(String),

    /// Configuration file unreadable or invalid
    #[error("Config error: {0}")]
    Config(String),

    /// Database errors (SQLite operations)
    #[error("Database error: {0}")]
    Database(String),

    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SearchError
pub type Result<T> = std::result::Result<T, SearchError>;
