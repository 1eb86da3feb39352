use serde::Serialize;

use super::domain::{
    AdminAgency, AgencyId, Company, CompanyId, IndustryId, Qualification, QualificationId,
    QualificationIndustry,
};
use super::status::StatusInfo;

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over companies and issuing agencies.
pub trait CompanyDirectory: Send + Sync {
    /// Inserts a company, assigning its id. `Conflict` on a duplicate name.
    fn insert_company(&self, company: Company) -> Result<Company, RepositoryError>;
    fn update_company(&self, company: Company) -> Result<(), RepositoryError>;
    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn fetch_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError>;
    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    /// Removes the company row only. The ownership guard lives in the
    /// service, which checks the qualification count first.
    fn delete_company(&self, id: CompanyId) -> Result<(), RepositoryError>;

    fn insert_agency(&self, agency: AdminAgency) -> Result<AdminAgency, RepositoryError>;
    fn fetch_agency(&self, id: AgencyId) -> Result<Option<AdminAgency>, RepositoryError>;
    fn fetch_agency_by_name(&self, name: &str) -> Result<Option<AdminAgency>, RepositoryError>;
    fn list_agencies(&self) -> Result<Vec<AdminAgency>, RepositoryError>;
}

/// Storage abstraction over qualifications and their industry rows, so the
/// service module can be exercised against an in-memory store in tests.
pub trait QualificationRepository: Send + Sync {
    fn insert(&self, qualification: Qualification) -> Result<Qualification, RepositoryError>;
    fn update(&self, qualification: Qualification) -> Result<(), RepositoryError>;
    fn fetch(&self, id: QualificationId) -> Result<Option<Qualification>, RepositoryError>;
    /// Deletes the qualification and cascades to its industry rows.
    fn delete(&self, id: QualificationId) -> Result<(), RepositoryError>;
    fn list_by_company(&self, company: CompanyId) -> Result<Vec<Qualification>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<Qualification>, RepositoryError>;
    fn count_by_company(&self, company: CompanyId) -> Result<usize, RepositoryError>;

    fn insert_industry(
        &self,
        industry: QualificationIndustry,
    ) -> Result<QualificationIndustry, RepositoryError>;
    fn update_industry(&self, industry: QualificationIndustry) -> Result<(), RepositoryError>;
    fn fetch_industry(
        &self,
        id: IndustryId,
    ) -> Result<Option<QualificationIndustry>, RepositoryError>;
    fn delete_industry(&self, id: IndustryId) -> Result<(), RepositoryError>;
    fn industries_of(
        &self,
        qualification: QualificationId,
    ) -> Result<Vec<QualificationIndustry>, RepositoryError>;
}

/// Read model joining a qualification with its company, agency, derived
/// status, and industry rows. Built fresh per read by the service.
#[derive(Debug, Clone, Serialize)]
pub struct QualificationView {
    pub qualification: Qualification,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    pub status: StatusInfo,
    pub industries: Vec<QualificationIndustry>,
}
