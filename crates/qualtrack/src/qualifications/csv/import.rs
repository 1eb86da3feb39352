use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::encoding::{decode_for_import, DecodeError};
use super::DATE_FORMAT;
use crate::qualifications::domain::{normalize_text, QualificationDraft};

/// One decoded data row, before the service resolves its agency and
/// persists it. `line` is the 1-based data-row index (header excluded).
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub line: usize,
    pub agency_name: Option<String>,
    pub draft: QualificationDraft,
}

/// Row-scoped rejection. Rendered as `row N: field: reason` in the batch
/// report.
#[derive(Debug, Clone, thiserror::Error)]
#[error("row {line}: {field}: {reason}")]
pub struct RowError {
    pub line: usize,
    pub field: &'static str,
    pub reason: String,
}

/// Batch-level failure: the upload could not be read at all. Row-level
/// problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    #[error(transparent)]
    Encoding(#[from] DecodeError),
}

/// Raw header-mapped row; every column is read as text, no coercion.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Company Name", default, deserialize_with = "blank_as_none")]
    _company_name: Option<String>,
    #[serde(rename = "Issuing Agency", default, deserialize_with = "blank_as_none")]
    issuing_agency: Option<String>,
    #[serde(
        rename = "Registration Number",
        default,
        deserialize_with = "blank_as_none"
    )]
    registration_number: Option<String>,
    #[serde(rename = "Valid From", default, deserialize_with = "blank_as_none")]
    valid_from: Option<String>,
    #[serde(rename = "Valid Until", default, deserialize_with = "blank_as_none")]
    valid_until: Option<String>,
    #[serde(
        rename = "Next Application Deadline",
        default,
        deserialize_with = "blank_as_none"
    )]
    next_application_deadline: Option<String>,
    #[serde(
        rename = "Application Status",
        default,
        deserialize_with = "blank_as_none"
    )]
    application_status: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "blank_as_none")]
    notes: Option<String>,
    #[serde(rename = "Notification URL", default, deserialize_with = "blank_as_none")]
    notification_url: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(
    value: Option<String>,
    line: usize,
    field: &'static str,
) -> Result<Option<NaiveDate>, RowError> {
    match value {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| RowError {
                line,
                field,
                reason: format!("'{}' is not a YYYY-MM-DD date", raw.trim()),
            }),
    }
}

impl CsvRow {
    fn into_parsed(self, line: usize) -> Result<ParsedRow, RowError> {
        let registration_number = self.registration_number.ok_or(RowError {
            line,
            field: "registration number",
            reason: "required field is empty".to_string(),
        })?;

        Ok(ParsedRow {
            line,
            agency_name: normalize_text(self.issuing_agency),
            draft: QualificationDraft {
                agency_id: None,
                registration_number: registration_number.trim().to_string(),
                valid_from: parse_date(self.valid_from, line, "valid from")?,
                valid_until: parse_date(self.valid_until, line, "valid until")?,
                next_application_on: parse_date(
                    self.next_application_deadline,
                    line,
                    "next application deadline",
                )?,
                application_status: normalize_text(self.application_status),
                notes: normalize_text(self.notes),
                notification_url: normalize_text(self.notification_url),
            },
        })
    }
}

/// Decodes and parses an uploaded CSV. The batch never aborts on a bad row;
/// each data row yields either a draft or a positioned error. The owning
/// company column is ignored on import since the upload is already scoped
/// to one company.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<Result<ParsedRow, RowError>>, CsvImportError> {
    let text = decode_for_import(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 1;
        let outcome = match record {
            Ok(row) => row.into_parsed(line),
            Err(err) => Err(RowError {
                line,
                field: "row",
                reason: format!("unreadable record: {err}"),
            }),
        };
        rows.push(outcome);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> &'static str {
        "\"Company Name\",\"Issuing Agency\",\"Registration Number\",\"Valid From\",\"Valid Until\",\"Next Application Deadline\",\"Application Status\",\"Notes\",\"Notification URL\"\n"
    }

    #[test]
    fn well_formed_rows_parse_into_drafts() {
        let body = format!(
            "{}\"Acme Corp\",\"Kanto Bureau\",\"REG-100\",\"2025-04-01\",\"2027-03-31\",\"2027-01-15\",\"awaiting action\",\"\",\"https://example.com/notice.pdf\"\n",
            header()
        );
        let rows = parse_import(body.as_bytes()).expect("batch readable");
        assert_eq!(rows.len(), 1);
        let parsed = rows[0].as_ref().expect("row valid");
        assert_eq!(parsed.draft.registration_number, "REG-100");
        assert_eq!(parsed.agency_name.as_deref(), Some("Kanto Bureau"));
        assert_eq!(
            parsed.draft.valid_until,
            NaiveDate::from_ymd_opt(2027, 3, 31)
        );
        assert_eq!(
            parsed.draft.application_status.as_deref(),
            Some("awaiting action")
        );
    }

    #[test]
    fn missing_registration_number_rejects_only_that_row() {
        let body = format!(
            "{}\"Acme\",\"\",\"\",\"\",\"\",\"\",\"\",\"\",\"\"\n\"Acme\",\"\",\"REG-2\",\"\",\"\",\"\",\"\",\"\",\"\"\n",
            header()
        );
        let rows = parse_import(body.as_bytes()).expect("batch readable");
        assert_eq!(rows.len(), 2);
        let err = rows[0].as_ref().expect_err("first row rejected");
        assert_eq!(err.line, 1);
        assert_eq!(err.field, "registration number");
        assert!(rows[1].is_ok());
    }

    #[test]
    fn malformed_dates_are_positioned_errors() {
        let body = format!(
            "{}\"Acme\",\"\",\"REG-3\",\"2025/04/01\",\"\",\"\",\"\",\"\",\"\"\n",
            header()
        );
        let rows = parse_import(body.as_bytes()).expect("batch readable");
        let err = rows[0].as_ref().expect_err("bad date rejected");
        assert_eq!(err.field, "valid from");
        assert!(err.to_string().starts_with("row 1:"));
    }

    #[test]
    fn shift_jis_uploads_decode() {
        let body = format!("{}\"株式会社東和\",\"\",\"REG-9\",\"\",\"\",\"\",\"\",\"\",\"\"\n", header());
        let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&body);
        assert!(!had_errors);
        let rows = parse_import(&encoded).expect("batch readable");
        assert!(rows[0].is_ok());
    }
}
