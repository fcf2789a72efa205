//! REST API request and response types.
//!
//! Every response carries a fresh `jobId` and a `status` of `ready`,
//! `warning` or `error`, so the frontend can badge results uniformly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::cwr::{
    status_description, CwrVersion, GenerationOptions, OutcomeReport, StatusDescription, TransactionType,
    Transmission, ValidationReport,
};
use crate::models::RoyaltyStatement;
use crate::pipeline::{AcknowledgmentOutcome, GeneratedTransmission};
use crate::royalty::DistributionReport;

fn job_id() -> String {
    Uuid::new_v4().to_string()
}

fn status(errors: bool, warnings: bool) -> String {
    if errors {
        "error"
    } else if warnings {
        "warning"
    } else {
        "ready"
    }
    .to_string()
}

// =============================================================================
// Generation
// =============================================================================

/// Generation options as posted. Absent fields fall back to the server
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptionsRequest {
    pub version: Option<CwrVersion>,
    pub transaction_type: Option<TransactionType>,
    pub recipient_society: Option<String>,
    pub submitter_code: Option<String>,
    pub work_ids: Vec<String>,
}

impl GenerateOptionsRequest {
    pub fn into_options(self, config: &AppConfig) -> GenerationOptions {
        GenerationOptions {
            version: self.version.unwrap_or(config.default_version),
            transaction_type: self.transaction_type.unwrap_or_default(),
            recipient_society: self
                .recipient_society
                .unwrap_or_else(|| config.recipient_society.clone()),
            submitter_code: self.submitter_code.unwrap_or_default(),
            work_ids: self.work_ids,
        }
    }
}

/// `POST /api/cwr/generate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Catalog document, schema-checked before use.
    pub catalog: Value,
    #[serde(default)]
    pub options: GenerateOptionsRequest,
    /// Reject dangling writer/publisher references.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: String,
    pub transmission: Transmission,
    pub validation: ValidationReport,
}

impl From<GeneratedTransmission> for GenerateResponse {
    fn from(generated: GeneratedTransmission) -> Self {
        Self {
            job_id: job_id(),
            status: status(!generated.validation.valid, !generated.validation.warnings.is_empty()),
            transmission: generated.transmission,
            validation: generated.validation,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// `POST /api/cwr/validate` response. The request body is the raw
/// transmission text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub job_id: String,
    pub status: String,
    pub validation: ValidationReport,
}

impl From<ValidationReport> for ValidateResponse {
    fn from(validation: ValidationReport) -> Self {
        Self {
            job_id: job_id(),
            status: status(!validation.valid, !validation.warnings.is_empty()),
            validation,
        }
    }
}

// =============================================================================
// Acknowledgments
// =============================================================================

/// `POST /api/ack` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub encoding: String,
    pub records: Vec<crate::cwr::AcknowledgmentRecord>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<OutcomeReport>,
    /// Labels for every status code present in the file.
    pub statuses: Vec<StatusDescription>,
}

impl AckResponse {
    pub fn new(outcome: AcknowledgmentOutcome, file_name: Option<String>) -> Self {
        let mut statuses: Vec<StatusDescription> = Vec::new();
        for ack in outcome.parse.acks() {
            if let Some(desc) = status_description(&ack.transaction_status) {
                if !statuses.iter().any(|s| s.code == desc.code) {
                    statuses.push(*desc);
                }
            }
        }

        Self {
            job_id: job_id(),
            status: status(false, !outcome.parse.success),
            file_name,
            encoding: outcome.encoding,
            records: outcome.parse.records,
            errors: outcome.parse.errors,
            outcomes: outcome.outcomes,
            statuses,
        }
    }
}

// =============================================================================
// Royalties
// =============================================================================

/// `POST /api/royalties/distribute`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    pub catalog: Value,
    pub statement: RoyaltyStatement,
    /// Default admin fee percent for writers without an agreement fee.
    #[serde(default)]
    pub fee: Option<f64>,
    /// Also render the report as CSV.
    #[serde(default)]
    pub include_csv: bool,
    /// Match every line item against the catalog before distributing,
    /// replacing the `workId`/`matched` values sent.
    #[serde(default)]
    pub rematch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeResponse {
    pub job_id: String,
    pub status: String,
    pub report: DistributionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

impl DistributeResponse {
    pub fn new(report: DistributionReport, csv: Option<String>) -> Self {
        Self {
            job_id: job_id(),
            status: status(false, !report.errors.is_empty() || !report.skipped_line_items.is_empty()),
            report,
            csv,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": job_id(),
        "status": "error",
        "error": error,
    })
}
