//! CSV export of a distribution report.

use std::io;

use super::distribution::DistributionReport;

const HEADER: [&str; 7] = [
    "Writer Name",
    "IPI Number",
    "Work Title",
    "Gross Amount",
    "Publisher Fee",
    "Net Amount",
    "Currency",
];

/// Column that carries the amount of a summary row.
#[derive(Clone, Copy)]
enum AmountColumn {
    Gross = 3,
    Fee = 4,
    Net = 5,
}

/// One row per writer per work, a subtotal row per writer, then the
/// statement and publisher summary rows. Amounts have two decimals.
pub fn render_distribution_csv(report: &DistributionReport) -> io::Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let currency = report.currency.as_str();

    writer.write_record(HEADER)?;

    for total in &report.writers {
        let ipi = total.ipi_name_number.as_deref().unwrap_or("");
        for work in &total.works {
            writer.write_record([
                total.writer_name.clone(),
                ipi.to_string(),
                work.work_title.clone(),
                money(work.gross_amount),
                money(work.fee_amount),
                money(work.net_amount),
                currency.to_string(),
            ])?;
        }
        writer.write_record([
            format!("{} - TOTAL", total.writer_name),
            String::new(),
            String::new(),
            money(total.gross_amount),
            money(total.fee_amount),
            money(total.net_amount),
            currency.to_string(),
        ])?;
    }

    let summary = [
        ("TOTAL GROSS", AmountColumn::Gross, report.total_gross),
        ("TOTAL FEES", AmountColumn::Fee, report.total_fees),
        ("TOTAL NET", AmountColumn::Net, report.total_net),
        ("PUBLISHER FEE INCOME", AmountColumn::Fee, report.publisher.fee_income),
        ("PUBLISHER OWNED SHARE", AmountColumn::Gross, report.publisher.owned_share),
        ("PUBLISHER TOTAL INCOME", AmountColumn::Gross, report.publisher.total_income),
    ];
    for (label, column, amount) in summary {
        let mut row = vec![String::new(); HEADER.len()];
        row[0] = label.to_string();
        row[column as usize] = money(amount);
        row[6] = currency.to_string();
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}
