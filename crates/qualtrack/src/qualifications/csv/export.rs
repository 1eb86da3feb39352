use chrono::NaiveDate;

use super::encoding::{encode_for_export, EncodedText};
use super::{CSV_HEADERS, DATE_FORMAT};
use crate::qualifications::repository::QualificationView;

/// Result of building an export payload. Rows missing any of the three
/// dates are left out of the payload and surfaced through `skipped` so the
/// caller can tell the user instead of shipping half-empty rows.
#[derive(Debug)]
pub struct ExportOutcome {
    pub payload: EncodedText,
    pub rows: usize,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("unable to assemble csv: {0}")]
    Write(#[from] csv::Error),
    #[error("unable to finalize csv buffer")]
    Finalize,
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serializes qualification views into the fixed 9-column layout, every
/// field quoted, then negotiates the output encoding.
pub fn export_views(views: &[QualificationView]) -> Result<ExportOutcome, CsvExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;

    let mut rows = 0usize;
    let mut skipped = 0usize;

    for view in views {
        let q = &view.qualification;
        let (Some(valid_from), Some(valid_until), Some(next_application_on)) =
            (q.valid_from, q.valid_until, q.next_application_on)
        else {
            skipped += 1;
            continue;
        };

        writer.write_record([
            view.company_name.as_str(),
            view.agency_name.as_deref().unwrap_or(""),
            q.registration_number.as_str(),
            &format_date(valid_from),
            &format_date(valid_until),
            &format_date(next_application_on),
            q.application_status.as_deref().unwrap_or(""),
            q.notes.as_deref().unwrap_or(""),
            q.notification_url.as_deref().unwrap_or(""),
        ])?;
        rows += 1;
    }

    let buffer = writer.into_inner().map_err(|_| CsvExportError::Finalize)?;
    let text = String::from_utf8(buffer).map_err(|_| CsvExportError::Finalize)?;

    Ok(ExportOutcome {
        payload: encode_for_export(&text),
        rows,
        skipped,
    })
}
