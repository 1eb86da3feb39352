//! Bidirectional CSV codec for the qualification list: fixed 9-column
//! layout, quoted fields, `YYYY-MM-DD` dates, legacy-codepage negotiation.

pub(crate) mod encoding;
pub(crate) mod export;
pub(crate) mod import;

/// Column order shared by export and header-driven import.
pub const CSV_HEADERS: [&str; 9] = [
    "Company Name",
    "Issuing Agency",
    "Registration Number",
    "Valid From",
    "Valid Until",
    "Next Application Deadline",
    "Application Status",
    "Notes",
    "Notification URL",
];

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub use encoding::{Charset, DecodeError, EncodedText};
pub use export::{CsvExportError, ExportOutcome};
pub use import::{CsvImportError, ParsedRow, RowError};
