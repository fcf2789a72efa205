//! # cwrgen - Common Works Registration and royalty distribution
//!
//! cwrgen registers a music publisher's catalog with collecting societies
//! as CWR transmissions, reads the societies' acknowledgment files back, and
//! splits incoming royalty statements across the catalog's writers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Catalog    │────▶│  Assembler  │────▶│  CWR file   │────▶│  Society    │
//! │  (JSON)     │     │  (records)  │     │  (.Vnn)     │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐            │
//! │  Writer     │◀────│ Distribution│◀────│  Statement  │◀───────────┤
//! │  payouts    │     │  (fees)     │     │  (CSV)      │     ACK file
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cwrgen::{generate_transmission, load_catalog_file, GenerationOptions};
//!
//! let catalog = load_catalog_file("catalog.json".as_ref(), false)?;
//! let generated = generate_transmission(&catalog, &GenerationOptions::default())?;
//! println!("{} ({} records)", generated.transmission.filename, generated.transmission.record_count);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Catalog and royalty statement models
//! - [`cwr`] - Record encoding, validation, acknowledgment parsing
//! - [`royalty`] - Statement import, distribution, CSV export
//! - [`parser`] - Text decoding and CSV parsing with auto-detection
//! - [`validation`] - Catalog JSON Schema validation
//! - [`config`] - Environment configuration
//! - [`pipeline`] - Logged orchestration for the CLI and server
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// CWR
pub mod cwr;

// Royalties
pub mod royalty;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Configuration
pub mod config;

// Orchestration
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AckLineError, CatalogError, CatalogResult, PipelineError, PipelineResult, ServerError, StatementError,
    StatementResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Catalog, PublisherSettings, RightType, RoyaltyLineItem, RoyaltyStatement, Work, Writer, WriterShare,
};

// =============================================================================
// Re-exports - CWR
// =============================================================================

pub use cwr::{
    generate_cwr, generate_cwr_at, match_outcomes, parse_ack, status_description, status_descriptions,
    transmission_filename, validate_cwr, AckParseResult, AcknowledgmentRecord, CwrVersion, GenerationOptions,
    OutcomeReport, TransactionType, Transmission, ValidationReport, WorkOutcome,
};

// =============================================================================
// Re-exports - Royalties
// =============================================================================

pub use royalty::{
    calculate_distribution, generate_distribution_report, match_line_items, parse_royalty_csv,
    render_distribution_csv, ColumnMapping, DistributionReport, DistributionResult, StatementImport,
};

// =============================================================================
// Re-exports - Parsing and validation
// =============================================================================

pub use parser::{decode_text, parse_bytes_auto, read_text_file, CsvError, DecodedText, ParseResult};
pub use validation::{load_catalog, load_catalog_file, validate_catalog};

// =============================================================================
// Re-exports - Configuration and pipeline
// =============================================================================

pub use config::AppConfig;
pub use pipeline::{
    acknowledge, check_transmission, distribute_statement, generate_transmission, import_statement,
    resolve_default_fee, AcknowledgmentOutcome, GeneratedTransmission, ImportedStatement, StatementInfo,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
