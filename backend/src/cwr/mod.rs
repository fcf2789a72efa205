//! CWR transmission encoding, validation and acknowledgment decoding.
//!
//! - [`fields`] - Fixed-width field formatting
//! - [`context`] - Versions, transaction types, sequence state
//! - [`records`] - One builder per record kind
//! - [`assembler`] - Works to a complete transmission
//! - [`validator`] - Structural checks
//! - [`ack`] - Society acknowledgment files

pub mod ack;
pub mod assembler;
pub mod context;
pub mod fields;
pub mod records;
pub mod validator;

pub use ack::{
    match_outcomes, parse_ack, status_description, status_descriptions, AckParseResult, AcknowledgmentRecord,
    OutcomeReport, Severity, StatusDescription, WorkOutcome,
};
pub use assembler::{generate_cwr, generate_cwr_at, transmission_filename, GenerationOptions, Transmission};
pub use context::{CwrContext, CwrVersion, TransactionType};
pub use records::RecordKind;
pub use validator::{validate_cwr, ValidationReport};
