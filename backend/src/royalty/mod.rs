//! Royalty statements: import, matching, distribution and export.
//!
//! - [`statement`] - CSV import and line-item matching
//! - [`distribution`] - Writer/publisher split per line and per statement
//! - [`report`] - CSV rendering of a distribution report

pub mod distribution;
pub mod report;
pub mod statement;

pub use distribution::{
    calculate_distribution, generate_distribution_report, generate_distribution_report_at, DistributionReport,
    DistributionResult, PublisherTotal, WriterDistribution, WriterTotal,
};
pub use report::render_distribution_csv;
pub use statement::{match_line_item, match_line_items, parse_amount, parse_royalty_csv, ColumnMapping, StatementImport};
