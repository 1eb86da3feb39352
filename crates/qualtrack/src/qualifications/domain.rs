use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for partner companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub u64);

/// Identifier wrapper for issuing agencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgencyId(pub u64);

/// Identifier wrapper for qualification records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualificationId(pub u64);

/// Identifier wrapper for per-industry grading records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndustryId(pub u64);

/// A partner company that holds qualifications. Names are unique across the
/// store; a company cannot be deleted while it still owns qualifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Government body that issues qualifications. Referenced, never owned;
/// views render "unset" when a qualification carries no agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAgency {
    pub id: AgencyId,
    pub name: String,
}

/// A business license/certification held by a company, with its validity
/// window and renewal deadline. Status is derived, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub id: QualificationId,
    pub company_id: CompanyId,
    pub agency_id: Option<AgencyId>,
    pub registration_number: String,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub next_application_on: Option<NaiveDate>,
    pub application_status: Option<String>,
    pub notes: Option<String>,
    pub notification_url: Option<String>,
    /// Username of the last editor. Denormalized on purpose; not a foreign
    /// key into the accounts store.
    pub updated_by: String,
}

/// Per-industry grading detail owned by one qualification. Cascades away
/// with its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationIndustry {
    pub id: IndustryId,
    pub qualification_id: QualificationId,
    pub industry_name: String,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub total_score: Option<u32>,
    pub rating: Option<String>,
}

/// Validated input for creating or updating a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Validated input for creating or updating a qualification. Built once at
/// the HTTP boundary and passed by value into the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationDraft {
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
    pub registration_number: String,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub next_application_on: Option<NaiveDate>,
    #[serde(default)]
    pub application_status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notification_url: Option<String>,
}

/// Validated input for an industry grading row. `total_score` arrives as
/// free text from forms and CSV alike; see [`parse_total_score`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryDraft {
    pub industry_name: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_score: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Parses an industry total score from free text. Malformed or negative
/// input is stored as absent rather than rejected.
pub fn parse_total_score(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u32>().ok()
}

/// Normalizes an optional text field: blank strings collapse to `None`.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
