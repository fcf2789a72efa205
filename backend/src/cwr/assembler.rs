//! Transmission assembly.
//!
//! Drives the record builders over a list of works in one linear pass:
//!
//! ```text
//! HDR
//! GRH
//!   NWR/REV  (record 0 of each transaction)
//!   SPU, SPT*          per publisher share
//!   SWR, SWT, PWR      per controlled writer share
//!   OWR                per uncontrolled writer share
//!   ALT                per alternate title
//!   PER*, REC          per recording (3.0 and 3.1 only)
//! GRT
//! TRL
//! ```
//!
//! The assembler never validates its input: a work without writers or
//! publishers still yields a syntactically valid transaction.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::context::{CwrContext, CwrVersion, TransactionType};
use super::records::{self, RecordKind};
use crate::models::{PublisherSettings, Work, WriterShare};

/// Only one group per transmission is produced.
pub const GROUP_ID: u64 = 1;

/// Line terminator between records.
pub const LINE_ENDING: &str = "\r\n";

/// Options for one generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub version: CwrVersion,
    #[serde(default)]
    pub transaction_type: TransactionType,
    /// Receiving society code (first three characters go in the filename).
    #[serde(default)]
    pub recipient_society: String,
    /// Overrides the settings' delivery code when non-empty.
    #[serde(default)]
    pub submitter_code: String,
    /// Restrict generation to these catalog work ids. Empty means all.
    #[serde(default)]
    pub work_ids: Vec<String>,
}

/// A generated transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transmission {
    /// Records joined with CR+LF.
    pub content: String,
    pub filename: String,
    pub records: Vec<String>,
    /// Catalog ids of the encoded works, in transaction order.
    pub work_ids: Vec<String>,
    pub transaction_count: u64,
    pub record_count: u64,
}

/// Generate a transmission stamped with the local clock.
pub fn generate_cwr(works: &[Work], settings: &PublisherSettings, options: &GenerationOptions) -> Transmission {
    generate_cwr_at(works, settings, options, Local::now().naive_local())
}

/// Generate a transmission with an explicit creation timestamp.
pub fn generate_cwr_at(
    works: &[Work],
    settings: &PublisherSettings,
    options: &GenerationOptions,
    created: NaiveDateTime,
) -> Transmission {
    let submitter = if options.submitter_code.trim().is_empty() {
        settings.delivery_code.clone()
    } else {
        options.submitter_code.clone()
    };
    let mut ctx = CwrContext::new(
        settings,
        options.version,
        options.transaction_type,
        submitter,
        options.recipient_society.clone(),
    );

    let mut records = vec![
        records::transmission_header(&ctx, created),
        records::group_header(&ctx, GROUP_ID),
    ];
    let mut work_ids = Vec::new();
    let mut detail_count: u64 = 0;

    for work in select_works(works, &options.work_ids) {
        ctx.begin_transaction();
        let before = records.len();
        encode_work(&mut ctx, work, &mut records);
        detail_count += (records.len() - before) as u64;
        work_ids.push(work.id.clone());
    }

    let transaction_count = ctx.transaction_sequence;
    records.push(records::group_trailer(GROUP_ID, transaction_count, detail_count));
    // The file trailer counts every line, itself included.
    let record_count = records.len() as u64 + 1;
    records.push(records::transmission_trailer(1, transaction_count, record_count));

    let filename = transmission_filename(
        created.date(),
        &ctx.submitter_code,
        &ctx.recipient_society,
        ctx.version,
    );

    Transmission {
        content: records.join(LINE_ENDING),
        filename,
        records,
        work_ids,
        transaction_count,
        record_count,
    }
}

/// `CW<YYMMDD><SUBMITTER3><RECIPIENT3>.V<NN>`
pub fn transmission_filename(date: NaiveDate, submitter: &str, recipient: &str, version: CwrVersion) -> String {
    format!(
        "CW{}{}{}.V{}",
        date.format("%y%m%d"),
        party_code(submitter),
        party_code(recipient),
        version.file_code()
    )
}

fn party_code(code: &str) -> String {
    let code: String = code.trim().chars().take(3).collect::<String>().to_uppercase();
    if code.is_empty() {
        "XXX".to_string()
    } else {
        code
    }
}

fn select_works<'w>(works: &'w [Work], ids: &'w [String]) -> impl Iterator<Item = &'w Work> + 'w {
    works
        .iter()
        .filter(move |w| ids.is_empty() || ids.iter().any(|id| *id == w.id))
}

/// Emit every record of one transaction. The header keeps record sequence 0.
fn encode_work(ctx: &mut CwrContext<'_>, work: &Work, out: &mut Vec<String>) {
    out.push(records::work_header(ctx, work));

    for (idx, share) in work.publisher_shares.iter().enumerate() {
        let publisher_seq = idx + 1;
        ctx.next_record();
        out.push(records::publisher_share(ctx, share, publisher_seq));
        for (t_idx, territory) in share.territories.iter().enumerate() {
            ctx.next_record();
            out.push(records::publisher_territory(ctx, share, publisher_seq, territory, t_idx + 1));
        }
    }

    for (idx, share) in work.writer_shares.iter().enumerate() {
        let writer_seq = idx + 1;
        for kind in RecordKind::writer_plan(share.is_controlled()) {
            if let Some(line) = writer_record(*kind, ctx, share, writer_seq) {
                out.push(line);
            }
        }
    }

    for title in &work.alternate_titles {
        ctx.next_record();
        out.push(records::alternate_title(ctx, title));
    }

    if RecordKind::Recording.supported_by(ctx.version) {
        for recording in &work.recordings {
            for artist in &recording.artists {
                ctx.next_record();
                out.push(records::performer(ctx, artist));
            }
            ctx.next_record();
            out.push(records::recording(ctx, recording));
        }
    }
}

/// Build one writer-related record, advancing the record sequence only when
/// a line is produced.
fn writer_record(
    kind: RecordKind,
    ctx: &mut CwrContext<'_>,
    share: &WriterShare,
    writer_seq: usize,
) -> Option<String> {
    let build: fn(&CwrContext<'_>, &WriterShare, usize) -> String = match kind {
        RecordKind::WriterShare => records::writer_share,
        RecordKind::WriterTerritory => records::writer_territory,
        RecordKind::OtherWriter => records::other_writer,
        RecordKind::PublisherForWriter => link_to_submitter,
        _ => return None,
    };
    ctx.next_record();
    Some(build(ctx, share, writer_seq))
}

/// Controlled writers are always linked to the submitting publisher (P1).
fn link_to_submitter(ctx: &CwrContext<'_>, share: &WriterShare, writer_seq: usize) -> String {
    records::publisher_for_writer(ctx, share, writer_seq, 1)
}
