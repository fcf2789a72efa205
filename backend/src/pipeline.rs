//! High-level pipeline API shared by the CLI and the HTTP server.
//!
//! The core modules ([`crate::cwr`], [`crate::royalty`]) are pure and never
//! log. This layer strings them together, turns empty selections into
//! errors, and reports progress through [`crate::api::logs`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cwrgen::pipeline::generate_transmission;
//! use cwrgen::validation::load_catalog_file;
//! use std::path::Path;
//!
//! let catalog = load_catalog_file(Path::new("catalog.json"), false)?;
//! let generated = generate_transmission(&catalog, &Default::default())?;
//! std::fs::write(&generated.transmission.filename, &generated.transmission.content)?;
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::cwr::{
    generate_cwr, match_outcomes, parse_ack, validate_cwr, AckParseResult, GenerationOptions, OutcomeReport,
    Transmission, ValidationReport,
};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Catalog, PublisherSettings, RoyaltyStatement, Work};
use crate::parser::decode_text;
use crate::royalty::{
    generate_distribution_report, match_line_items, parse_royalty_csv, ColumnMapping, DistributionReport,
};

/// How many per-line problems are echoed to the log before summarizing.
const MAX_LOGGED_ERRORS: usize = 5;

// =============================================================================
// Generation
// =============================================================================

/// A transmission together with the structural check run on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTransmission {
    pub transmission: Transmission,
    pub validation: ValidationReport,
}

/// Encode the catalog's works (or the selected subset) and validate the result.
///
/// Fails with [`PipelineError::NoWorks`] when nothing would be encoded.
pub fn generate_transmission(catalog: &Catalog, options: &GenerationOptions) -> PipelineResult<GeneratedTransmission> {
    log_info(format!(
        "🎼 Generating CWR {} ({})",
        options.version,
        options.transaction_type.tag()
    ));

    let unknown: Vec<&str> = options
        .work_ids
        .iter()
        .filter(|id| !catalog.works.iter().any(|w| &w.id == *id))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        log_warning(format!("Unknown work id(s) ignored: {}", unknown.join(", ")));
    }

    let transmission = generate_cwr(&catalog.works, &catalog.settings, options);
    if transmission.transaction_count == 0 {
        log_error("No works selected for generation");
        return Err(PipelineError::NoWorks);
    }

    log_success(format!(
        "{} transaction(s), {} record(s) → {}",
        transmission.transaction_count, transmission.record_count, transmission.filename
    ));

    let validation = check_transmission(&transmission.content);
    Ok(GeneratedTransmission {
        transmission,
        validation,
    })
}

/// Run the structural validator and log its findings.
pub fn check_transmission(content: &str) -> ValidationReport {
    let report = validate_cwr(content);
    if report.valid {
        log_success("Transmission structure valid");
    } else {
        log_error(format!("Transmission invalid: {} error(s)", report.errors.len()));
    }
    for error in &report.errors {
        log_info_indent(error.clone(), 1);
    }
    for warning in &report.warnings {
        log_warning(warning.clone());
    }
    report
}

// =============================================================================
// Acknowledgments
// =============================================================================

/// A decoded acknowledgment file, with per-work outcomes when the submitted
/// works are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgmentOutcome {
    pub encoding: String,
    pub parse: AckParseResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<OutcomeReport>,
}

/// Decode and parse an acknowledgment file.
///
/// `works` must be in transmission order for sequence-based matching.
pub fn acknowledge(bytes: &[u8], works: Option<&[Work]>) -> AcknowledgmentOutcome {
    let decoded = decode_text(bytes);
    log_info(format!("📨 Parsing acknowledgment ({})", decoded.encoding));

    let parse = parse_ack(&decoded.content);
    let ack_count = parse.acks().count();
    if parse.success {
        log_success(format!("{} record(s), {} ACK", parse.records.len(), ack_count));
    } else {
        log_warning(format!(
            "{} record(s), {} ACK, {} line(s) rejected",
            parse.records.len(),
            ack_count,
            parse.errors.len()
        ));
        log_line_errors(&parse.errors);
    }

    let outcomes = works.map(|works| {
        let report = match_outcomes(&parse, works);
        log_info(format!(
            "Matched {} work outcome(s), {} unmatched record(s)",
            report.outcomes.len(),
            report.unmatched.len()
        ));
        report
    });

    AcknowledgmentOutcome {
        encoding: decoded.encoding,
        parse,
        outcomes,
    }
}

// =============================================================================
// Royalties
// =============================================================================

/// Statement-level fields that a CSV export does not carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementInfo {
    pub source: String,
    pub period: String,
    /// Defaults to USD when empty.
    pub currency: String,
}

/// An imported and matched statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedStatement {
    pub statement: RoyaltyStatement,
    pub errors: Vec<String>,
    pub encoding: String,
    pub delimiter: char,
}

/// Import a statement CSV and match its lines against the catalog.
pub fn import_statement(
    bytes: &[u8],
    mapping: &ColumnMapping,
    info: StatementInfo,
    catalog: &Catalog,
) -> PipelineResult<ImportedStatement> {
    let import = parse_royalty_csv(bytes, mapping)?;
    log_info(format!(
        "📄 {} statement line(s) ({}, delimiter '{}')",
        import.line_items.len(),
        import.encoding,
        import.delimiter
    ));
    if !import.errors.is_empty() {
        log_warning(format!("{} row problem(s)", import.errors.len()));
        log_line_errors(&import.errors);
    }

    let line_items = match_line_items(import.line_items, &catalog.works);
    let matched = line_items.iter().filter(|i| i.matched).count();
    log_info(format!("🔗 Matched {}/{} line(s) to catalog works", matched, line_items.len()));

    let statement = RoyaltyStatement {
        id: Uuid::new_v4().to_string(),
        source: info.source,
        period: info.period,
        currency: if info.currency.trim().is_empty() {
            "USD".to_string()
        } else {
            info.currency.trim().to_uppercase()
        },
        line_items,
    };

    Ok(ImportedStatement {
        statement,
        errors: import.errors,
        encoding: import.encoding,
        delimiter: import.delimiter,
    })
}

/// Admin fee for writers without an agreement fee: the explicit value, else
/// the catalog default, else the configured fallback.
pub fn resolve_default_fee(explicit: Option<f64>, settings: &PublisherSettings, fallback: f64) -> f64 {
    explicit.or(settings.default_admin_fee).unwrap_or(fallback)
}

/// Distribute a statement over the catalog's controlled writers.
///
/// Line items are taken as matched or unmatched exactly as given, and
/// unmatched revenue is skipped. With `rematch`, every line is matched
/// against the catalog again first, replacing the match it carried.
pub fn distribute_statement(
    catalog: &Catalog,
    mut statement: RoyaltyStatement,
    fee: Option<f64>,
    fallback_fee: f64,
    rematch: bool,
) -> DistributionReport {
    if rematch {
        statement.line_items = match_line_items(statement.line_items, &catalog.works);
        let matched = statement.line_items.iter().filter(|i| i.matched).count();
        log_info(format!(
            "🔗 Re-matched {}/{} line(s) to catalog works",
            matched,
            statement.line_items.len()
        ));
    }

    let default_fee = resolve_default_fee(fee, &catalog.settings, fallback_fee);
    log_info(format!(
        "💰 Distributing {} line(s) at {}% default admin fee",
        statement.line_items.len(),
        default_fee
    ));

    let report = generate_distribution_report(&statement, &catalog.works, default_fee);

    log_success(format!(
        "Gross {:.2} {}: writers net {:.2}, publisher {:.2}",
        report.total_gross, report.currency, report.total_net, report.publisher.total_income
    ));
    for writer in &report.writers {
        log_info_indent(format!("{}: {:.2}", writer.writer_name, writer.net_amount), 1);
    }
    if !report.skipped_line_items.is_empty() {
        log_warning(format!("{} unmatched line(s) skipped", report.skipped_line_items.len()));
    }
    log_line_errors(&report.errors);

    report
}

fn log_line_errors(errors: &[String]) {
    for error in errors.iter().take(MAX_LOGGED_ERRORS) {
        log_info_indent(error.clone(), 1);
    }
    if errors.len() > MAX_LOGGED_ERRORS {
        log_info_indent(format!("... and {} more", errors.len() - MAX_LOGGED_ERRORS), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RightType, RoyaltyLineItem};
    use crate::validation::load_catalog;
    use serde_json::json;

    fn catalog() -> Catalog {
        load_catalog(
            json!({
                "settings": { "name": "Nightfall Music", "ipiNameNumber": "00123456789", "deliveryCode": "NFM", "prSociety": "021" },
                "writers": [
                    { "id": "w1", "firstName": "Ada", "lastName": "Stone", "controlled": true, "agreementAdminFee": 20 },
                    { "id": "w2", "firstName": "Ben", "lastName": "Gray", "controlled": true }
                ],
                "publishers": [{ "id": "p1", "name": "Nightfall Music" }],
                "works": [
                    {
                        "id": "work-1",
                        "workId": "RWOR10001",
                        "title": "Midnight City",
                        "iswc": "T-123.456.789-0",
                        "writerShares": [
                            { "writerId": "w1", "capacity": "CA", "prOwnership": 30, "mrOwnership": 50 },
                            { "writerId": "w2", "capacity": "CA", "prOwnership": 20, "mrOwnership": 50 }
                        ],
                        "publisherShares": [{
                            "publisherId": "p1", "role": "E",
                            "prOwnership": 50, "prCollection": 100,
                            "territories": [{ "code": "2136" }]
                        }]
                    },
                    { "id": "work-2", "workId": "RWOR10002", "title": "Daybreak" }
                ]
            }),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_generate_transmission() {
        let generated = generate_transmission(&catalog(), &GenerationOptions::default()).unwrap();
        assert_eq!(generated.transmission.transaction_count, 2);
        assert!(generated.validation.valid);
    }

    #[test]
    fn test_generate_ignores_unknown_ids() {
        let options = GenerationOptions {
            work_ids: vec!["work-2".into(), "missing".into(), "also-missing".into()],
            ..GenerationOptions::default()
        };
        let generated = generate_transmission(&catalog(), &options).unwrap();
        assert_eq!(generated.transmission.transaction_count, 1);
    }

    #[test]
    fn test_generate_empty_selection_fails() {
        let options = GenerationOptions {
            work_ids: vec!["missing".into()],
            ..GenerationOptions::default()
        };
        assert!(matches!(
            generate_transmission(&catalog(), &options),
            Err(PipelineError::NoWorks)
        ));
        assert!(matches!(
            generate_transmission(&Catalog::default(), &GenerationOptions::default()),
            Err(PipelineError::NoWorks)
        ));
    }

    #[test]
    fn test_acknowledge_decodes_and_matches() {
        let works = catalog().works;
        let ack = format!(
            "{}\r\n{}\r\n",
            "ACK0000000100000000ASRWOR10001",
            "ACK0000000200000000RA"
        );
        let outcome = acknowledge(ack.as_bytes(), Some(&works));

        assert_eq!(outcome.encoding, "utf-8");
        assert!(outcome.parse.success);
        let report = outcome.outcomes.unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].work_id, "work-1");
        assert_eq!(report.outcomes[1].work_id, "work-2");
        assert_eq!(report.outcomes[1].status, "RA");
    }

    #[test]
    fn test_acknowledge_without_works() {
        let outcome = acknowledge(b"AC\n", None);
        assert!(!outcome.parse.success);
        assert!(outcome.outcomes.is_none());
    }

    #[test]
    fn test_import_statement() {
        let csv = "Title,ISWC,Right Type,Gross Amount\n\
                   Unknown Song,,PR,5\n\
                   ,T1234567890,MR,100\n";
        let info = StatementInfo {
            source: "ASCAP".into(),
            period: "2024-Q1".into(),
            currency: "eur".into(),
        };
        let imported = import_statement(csv.as_bytes(), &ColumnMapping::default(), info, &catalog()).unwrap();

        let statement = &imported.statement;
        assert_eq!(statement.currency, "EUR");
        assert_eq!(statement.source, "ASCAP");
        assert!(!statement.id.is_empty());
        assert!(!statement.line_items[0].matched);
        assert_eq!(statement.line_items[1].work_id.as_deref(), Some("work-1"));
        assert_eq!(statement.line_items[1].right_type, RightType::Mechanical);
    }

    #[test]
    fn test_resolve_default_fee() {
        let mut settings = PublisherSettings::default();
        assert_eq!(resolve_default_fee(None, &settings, 25.0), 25.0);
        settings.default_admin_fee = Some(15.0);
        assert_eq!(resolve_default_fee(None, &settings, 25.0), 15.0);
        assert_eq!(resolve_default_fee(Some(10.0), &settings, 25.0), 10.0);
    }

    fn line(id: &str, title: &str, gross: f64, work_id: Option<&str>) -> RoyaltyLineItem {
        RoyaltyLineItem {
            id: id.into(),
            work_id: work_id.map(String::from),
            work_title: Some(title.into()),
            right_type: RightType::Performance,
            gross_amount: gross,
            matched: work_id.is_some(),
            ..Default::default()
        }
    }

    #[test]
    fn test_distribute_keeps_unmatched_lines_out() {
        let statement = RoyaltyStatement {
            id: "s1".into(),
            currency: "USD".into(),
            line_items: vec![
                line("m", "Midnight City", 1000.0, Some("work-1")),
                line("u", "Midnight City", 500.0, None),
            ],
            ..Default::default()
        };
        let report = distribute_statement(&catalog(), statement, None, 25.0, false);

        assert!((report.total_gross - 1000.0).abs() < 1e-9);
        assert_eq!(report.skipped_line_items, vec!["u".to_string()]);
    }

    #[test]
    fn test_distribute_rematch() {
        let statement = RoyaltyStatement {
            id: "s1".into(),
            currency: "USD".into(),
            line_items: vec![line("l1", "midnight city", 100.0, None)],
            ..Default::default()
        };
        let report = distribute_statement(&catalog(), statement, Some(10.0), 25.0, true);

        assert!(report.skipped_line_items.is_empty());
        assert!((report.total_gross - 100.0).abs() < 1e-9);

        // 30/50 of 100 at the agreement fee of 20%, 20/50 at the default 10%.
        let ada = report.writer("w1").unwrap();
        assert!((ada.gross_amount - 60.0).abs() < 1e-9);
        assert!((ada.fee_amount - 12.0).abs() < 1e-9);
        let ben = report.writer("w2").unwrap();
        assert!((ben.fee_amount - 4.0).abs() < 1e-9);
        assert!((report.publisher.fee_income - 16.0).abs() < 1e-9);
    }
}
