//! Qualification lifecycle: domain records, the derived-status engine, the
//! CSV codec, and the service orchestrating them over the store traits.

pub mod csv;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    AdminAgency, AgencyId, Company, CompanyDraft, CompanyId, IndustryDraft, IndustryId,
    Qualification, QualificationDraft, QualificationId, QualificationIndustry,
};
pub use repository::{CompanyDirectory, QualificationRepository, QualificationView, RepositoryError};
pub use router::{qualification_router, QualificationApi};
pub use service::{ImportReport, QualificationService, SearchQuery, ServiceError};
pub use status::{status_info, StatusInfo, StatusLabel, StatusPolicy};
