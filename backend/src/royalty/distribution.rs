//! Distribution of royalty income to controlled writers.
//!
//! Per line item, the gross is split between the work's controlled writers
//! in proportion to their ownership for the item's right type. Shares are
//! re-normalized over the controlled writers, so partial catalog data never
//! under-pays them. Each writer's cut then pays the administration fee to
//! the publisher.
//!
//! The publisher additionally keeps its owned collection share, capped at
//! whatever gross the writers did not receive. Money out never exceeds
//! money in.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{RightType, RoyaltyLineItem, RoyaltyStatement, Work, WriterShare};

pub const NO_CONTROLLED_WRITERS: &str = "No controlled writers found for this work";

// =============================================================================
// Line item results
// =============================================================================

/// One writer's cut of a line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriterDistribution {
    pub writer_id: String,
    /// "Last, First"
    pub writer_name: String,
    pub ipi_name_number: Option<String>,
    /// Raw ownership percentage for the line's right type.
    pub share: f64,
    pub fee_percent: f64,
    pub gross_amount: f64,
    pub publisher_fee: f64,
    pub net_amount: f64,
}

/// Distribution of one line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub line_item_id: String,
    pub work_id: String,
    pub work_title: String,
    pub right_type: RightType,
    pub total_gross: f64,
    pub distributions: Vec<WriterDistribution>,
    /// Sum of writer fees.
    pub publisher_fee_income: f64,
    /// Publisher's own collection share of the line.
    pub publisher_owned_share: f64,
    /// Fees plus owned share.
    pub publisher_share: f64,
    pub errors: Vec<String>,
}

/// Split one line item across the work's controlled writers.
///
/// Never fails: a work without controlled writers yields zero distributions
/// and an entry in `errors`.
pub fn calculate_distribution(item: &RoyaltyLineItem, work: &Work, default_fee: f64) -> DistributionResult {
    let right = item.right_type;
    let gross = item.gross_amount;
    let controlled: Vec<&WriterShare> = work.writer_shares.iter().filter(|s| s.is_controlled()).collect();

    let mut errors = Vec::new();
    let mut distributions = Vec::with_capacity(controlled.len());

    if controlled.is_empty() {
        errors.push(NO_CONTROLLED_WRITERS.to_string());
    }

    let total_controlled: f64 = controlled.iter().map(|s| s.ownership(right)).sum();
    for share in &controlled {
        let ownership = share.ownership(right);
        let relative = if total_controlled > 0.0 { ownership / total_controlled } else { 0.0 };
        let writer = share.writer.as_ref();
        let fee_percent = writer.and_then(|w| w.agreement_admin_fee).unwrap_or(default_fee);

        let writer_gross = gross * relative;
        let fee = writer_gross * fee_percent / 100.0;
        distributions.push(WriterDistribution {
            writer_id: share.writer_id.clone(),
            writer_name: writer.map(|w| w.display_name()).unwrap_or_default(),
            ipi_name_number: writer.and_then(|w| w.ipi_name_number.clone()),
            share: ownership,
            fee_percent,
            gross_amount: writer_gross,
            publisher_fee: fee,
            net_amount: writer_gross - fee,
        });
    }

    let fee_income: f64 = distributions.iter().map(|d| d.publisher_fee).sum();
    let distributed: f64 = distributions.iter().map(|d| d.gross_amount).sum();
    let owned = owned_share(work, right, gross, distributed);

    DistributionResult {
        line_item_id: item.id.clone(),
        work_id: work.id.clone(),
        work_title: work.title.clone(),
        right_type: right,
        total_gross: gross,
        distributions,
        publisher_fee_income: fee_income,
        publisher_owned_share: owned,
        publisher_share: fee_income + owned,
        errors,
    }
}

fn owned_share(work: &Work, right: RightType, gross: f64, distributed: f64) -> f64 {
    let collection: f64 = work.publisher_shares.iter().map(|p| p.collection(right)).sum();
    if collection <= 0.0 {
        return 0.0;
    }
    let undistributed = (gross - distributed).max(0.0);
    (gross * collection / 100.0).min(undistributed).max(0.0)
}

// =============================================================================
// Statement report
// =============================================================================

/// One work's contribution to a writer's total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriterWorkAmount {
    pub work_id: String,
    pub work_title: String,
    pub gross_amount: f64,
    pub fee_amount: f64,
    pub net_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriterTotal {
    pub writer_id: String,
    pub writer_name: String,
    pub ipi_name_number: Option<String>,
    pub gross_amount: f64,
    pub fee_amount: f64,
    pub net_amount: f64,
    pub works: Vec<WriterWorkAmount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublisherTotal {
    pub fee_income: f64,
    pub owned_share: f64,
    pub total_income: f64,
}

/// Aggregated distribution of a whole statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    pub statement_id: String,
    pub source: String,
    pub period: String,
    pub currency: String,
    pub generated_at: NaiveDateTime,
    pub total_gross: f64,
    pub total_fees: f64,
    pub total_net: f64,
    /// In order of first appearance.
    pub writers: Vec<WriterTotal>,
    pub publisher: PublisherTotal,
    /// Ids of line items left out because they are unmatched.
    pub skipped_line_items: Vec<String>,
    /// Per-line calculation errors, prefixed with the line item id.
    pub errors: Vec<String>,
}

impl DistributionReport {
    pub fn writer(&self, writer_id: &str) -> Option<&WriterTotal> {
        self.writers.iter().find(|w| w.writer_id == writer_id)
    }
}

/// Aggregate a statement, stamped with the local clock.
pub fn generate_distribution_report(
    statement: &RoyaltyStatement,
    works: &[Work],
    default_fee: f64,
) -> DistributionReport {
    generate_distribution_report_at(statement, works, default_fee, Local::now().naive_local())
}

/// Aggregate a statement. Line items that are unmatched, or whose work is not
/// in `works`, are skipped and contribute nothing to any total.
pub fn generate_distribution_report_at(
    statement: &RoyaltyStatement,
    works: &[Work],
    default_fee: f64,
    generated_at: NaiveDateTime,
) -> DistributionReport {
    let mut report = DistributionReport {
        statement_id: statement.id.clone(),
        source: statement.source.clone(),
        period: statement.period.clone(),
        currency: statement.currency.clone(),
        generated_at,
        total_gross: 0.0,
        total_fees: 0.0,
        total_net: 0.0,
        writers: Vec::new(),
        publisher: PublisherTotal::default(),
        skipped_line_items: Vec::new(),
        errors: Vec::new(),
    };

    for item in &statement.line_items {
        let work = item
            .work_id
            .as_deref()
            .filter(|_| item.matched)
            .and_then(|id| works.iter().find(|w| w.id == id));
        let Some(work) = work else {
            report.skipped_line_items.push(item.id.clone());
            continue;
        };

        let result = calculate_distribution(item, work, default_fee);
        report.total_gross += result.total_gross;
        report
            .errors
            .extend(result.errors.iter().map(|e| format!("{}: {}", item.id, e)));

        for dist in &result.distributions {
            let idx = match report.writers.iter().position(|w| w.writer_id == dist.writer_id) {
                Some(idx) => idx,
                None => {
                    report.writers.push(WriterTotal {
                        writer_id: dist.writer_id.clone(),
                        writer_name: dist.writer_name.clone(),
                        ipi_name_number: dist.ipi_name_number.clone(),
                        gross_amount: 0.0,
                        fee_amount: 0.0,
                        net_amount: 0.0,
                        works: Vec::new(),
                    });
                    report.writers.len() - 1
                }
            };
            let total = &mut report.writers[idx];
            total.gross_amount += dist.gross_amount;
            total.fee_amount += dist.publisher_fee;
            total.net_amount += dist.net_amount;
            total.works.push(WriterWorkAmount {
                work_id: work.id.clone(),
                work_title: work.title.clone(),
                gross_amount: dist.gross_amount,
                fee_amount: dist.publisher_fee,
                net_amount: dist.net_amount,
            });

            report.total_fees += dist.publisher_fee;
            report.total_net += dist.net_amount;
        }

        report.publisher.fee_income += result.publisher_fee_income;
        report.publisher.owned_share += result.publisher_owned_share;
    }

    report.publisher.total_income = report.publisher.fee_income + report.publisher.owned_share;
    report
}
