//! Error types for the registration and royalty engine.
//!
//! The encoding core never fails on data gaps; these types cover the
//! surfaces around it:
//!
//! - [`CatalogError`] - Catalog document loading and reference resolution
//! - [`AckLineError`] - One malformed acknowledgment line (reported in-band)
//! - [`StatementError`] - Royalty statement import
//! - [`PipelineError`] - Top-level orchestration errors (CLI, API)
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::parser::CsvError;

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors while loading or resolving a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read file.
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),

    /// Document is not valid JSON or does not match the catalog shape.
    #[error("Invalid catalog JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Document failed schema validation.
    #[error("Catalog failed schema validation: {errors:?}")]
    SchemaError { errors: Vec<String> },

    /// A share references a party that is not in the catalog.
    #[error("Work '{work}' references unknown {kind} '{id}'")]
    UnresolvedReference {
        work: String,
        kind: &'static str,
        id: String,
    },
}

// =============================================================================
// Acknowledgment Errors
// =============================================================================

/// Why a single acknowledgment line could not be decoded.
///
/// Never returned as `Err` from the parser itself: each one is rendered into
/// the parse result's error list and parsing moves on to the next line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AckLineError {
    /// Not even a record type tag.
    #[error("record too short ({0} characters)")]
    TooShort(usize),

    /// Recognized tag, but the line ends before its required fields.
    #[error("truncated {tag} record: {len} characters, at least {min} required")]
    Truncated {
        tag: &'static str,
        len: usize,
        min: usize,
    },

    /// Transaction sequence is not a number.
    #[error("invalid transaction sequence '{0}'")]
    InvalidSequence(String),
}

// =============================================================================
// Statement Errors
// =============================================================================

/// Errors during royalty statement import.
#[derive(Debug, Error)]
pub enum StatementError {
    /// Underlying CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Header row and at least one data row are required.
    #[error("Statement must have a header row and at least one data row")]
    Empty,

    /// A mapped column required for import is absent.
    #[error("Required column \"{0}\" not found")]
    MissingColumn(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Statement import error.
    #[error("Statement error: {0}")]
    Statement(#[from] StatementError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No works selected for generation.
    #[error("No works selected for generation")]
    NoWorks,

    /// Unknown format version requested.
    #[error("Unsupported CWR version: {0}")]
    UnsupportedVersion(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for statement import.
pub type StatementResult<T> = Result<T, StatementError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
