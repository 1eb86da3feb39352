use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::csv::export::{export_views, ExportOutcome};
use super::csv::import::parse_import;
use super::csv::{CsvExportError, CsvImportError};
use super::domain::{
    normalize_text, parse_total_score, AdminAgency, Company, CompanyDraft, CompanyId, IndustryDraft,
    IndustryId, Qualification, QualificationDraft, QualificationId, QualificationIndustry,
};
use super::repository::{
    CompanyDirectory, QualificationRepository, QualificationView, RepositoryError,
};
use super::status::{StatusLabel, StatusPolicy};

/// Filter shared by search and export. The status filter matches the
/// derived label, so it is applied after view construction, never pushed
/// down to the store.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub company: Option<CompanyId>,
    pub keyword: Option<String>,
    pub status: Option<StatusLabel>,
}

/// Outcome of a best-effort CSV import: rows that validated are persisted,
/// the rest are reported in order. Never aborts on the first bad row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Error raised by the qualification service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("record not found")]
    NotFound,
    #[error("company still owns {count} qualification(s)")]
    CompanyInUse { count: usize },
    #[error(transparent)]
    Repository(RepositoryError),
    #[error("import file unreadable: {0}")]
    ImportUnreadable(#[from] CsvImportError),
    #[error(transparent)]
    Export(#[from] CsvExportError),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}

fn validation(field: &'static str, reason: impl Into<String>) -> ServiceError {
    ServiceError::Validation {
        field,
        reason: reason.into(),
    }
}

/// Service composing the company directory, qualification store, and status
/// policy. Constructed with explicit handles; every mutation takes the
/// acting username rather than reading ambient request state.
pub struct QualificationService<D, Q> {
    directory: Arc<D>,
    repository: Arc<Q>,
    policy: StatusPolicy,
}

impl<D, Q> QualificationService<D, Q>
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    pub fn new(directory: Arc<D>, repository: Arc<Q>, policy: StatusPolicy) -> Self {
        Self {
            directory,
            repository,
            policy,
        }
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    // --- companies -------------------------------------------------------

    pub fn create_company(&self, draft: CompanyDraft) -> Result<Company, ServiceError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(validation("company name", "must not be empty"));
        }

        let company = Company {
            id: CompanyId(0),
            name,
            postal_code: normalize_text(draft.postal_code),
            address: normalize_text(draft.address),
            phone: normalize_text(draft.phone),
        };

        self.directory.insert_company(company).map_err(|err| match err {
            RepositoryError::Conflict => {
                validation("company name", "a company with this name already exists")
            }
            other => other.into(),
        })
    }

    pub fn update_company(
        &self,
        id: CompanyId,
        draft: CompanyDraft,
    ) -> Result<Company, ServiceError> {
        let existing = self.directory.fetch_company(id)?.ok_or(ServiceError::NotFound)?;

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(validation("company name", "must not be empty"));
        }
        if let Some(other) = self.directory.fetch_company_by_name(&name)? {
            if other.id != id {
                return Err(validation(
                    "company name",
                    "a company with this name already exists",
                ));
            }
        }

        let updated = Company {
            id: existing.id,
            name,
            postal_code: normalize_text(draft.postal_code),
            address: normalize_text(draft.address),
            phone: normalize_text(draft.phone),
        };
        self.directory.update_company(updated.clone())?;
        Ok(updated)
    }

    pub fn get_company(&self, id: CompanyId) -> Result<Company, ServiceError> {
        self.directory.fetch_company(id)?.ok_or(ServiceError::NotFound)
    }

    pub fn list_companies(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.directory.list_companies()?)
    }

    /// Refused while the company still owns qualifications; nothing is
    /// deleted partially.
    pub fn delete_company(&self, id: CompanyId) -> Result<(), ServiceError> {
        self.directory.fetch_company(id)?.ok_or(ServiceError::NotFound)?;

        let count = self.repository.count_by_company(id)?;
        if count > 0 {
            return Err(ServiceError::CompanyInUse { count });
        }

        Ok(self.directory.delete_company(id)?)
    }

    // --- agencies --------------------------------------------------------

    pub fn create_agency(&self, name: &str) -> Result<AdminAgency, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("agency name", "must not be empty"));
        }
        self.directory
            .insert_agency(AdminAgency {
                id: super::domain::AgencyId(0),
                name: name.to_string(),
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    validation("agency name", "an agency with this name already exists")
                }
                other => other.into(),
            })
    }

    pub fn list_agencies(&self) -> Result<Vec<AdminAgency>, ServiceError> {
        Ok(self.directory.list_agencies()?)
    }

    fn find_or_create_agency(&self, name: &str) -> Result<AdminAgency, ServiceError> {
        if let Some(agency) = self.directory.fetch_agency_by_name(name)? {
            return Ok(agency);
        }
        self.create_agency(name)
    }

    // --- qualifications --------------------------------------------------

    fn qualification_from_draft(
        &self,
        id: QualificationId,
        company_id: CompanyId,
        draft: QualificationDraft,
        actor: &str,
    ) -> Result<Qualification, ServiceError> {
        let registration_number = draft.registration_number.trim().to_string();
        if registration_number.is_empty() {
            return Err(validation("registration number", "must not be empty"));
        }

        if let Some(agency_id) = draft.agency_id {
            if self.directory.fetch_agency(agency_id)?.is_none() {
                return Err(validation("issuing agency", "unknown agency"));
            }
        }

        Ok(Qualification {
            id,
            company_id,
            agency_id: draft.agency_id,
            registration_number,
            valid_from: draft.valid_from,
            valid_until: draft.valid_until,
            next_application_on: draft.next_application_on,
            application_status: normalize_text(draft.application_status),
            notes: normalize_text(draft.notes),
            notification_url: normalize_text(draft.notification_url),
            updated_by: actor.to_string(),
        })
    }

    pub fn create_qualification(
        &self,
        company_id: CompanyId,
        draft: QualificationDraft,
        actor: &str,
    ) -> Result<Qualification, ServiceError> {
        self.directory
            .fetch_company(company_id)?
            .ok_or(ServiceError::NotFound)?;

        let qualification =
            self.qualification_from_draft(QualificationId(0), company_id, draft, actor)?;
        Ok(self.repository.insert(qualification)?)
    }

    pub fn update_qualification(
        &self,
        id: QualificationId,
        draft: QualificationDraft,
        actor: &str,
    ) -> Result<Qualification, ServiceError> {
        let existing = self.repository.fetch(id)?.ok_or(ServiceError::NotFound)?;
        let updated = self.qualification_from_draft(id, existing.company_id, draft, actor)?;
        self.repository.update(updated.clone())?;
        Ok(updated)
    }

    /// Deletes the qualification and its industry rows, returning the owner
    /// id for post-action navigation.
    pub fn delete_qualification(&self, id: QualificationId) -> Result<CompanyId, ServiceError> {
        let existing = self.repository.fetch(id)?.ok_or(ServiceError::NotFound)?;
        self.repository.delete(id)?;
        Ok(existing.company_id)
    }

    pub fn get_qualification(
        &self,
        id: QualificationId,
        today: NaiveDate,
    ) -> Result<QualificationView, ServiceError> {
        let qualification = self.repository.fetch(id)?.ok_or(ServiceError::NotFound)?;
        self.build_view(qualification, today)
    }

    fn build_view(
        &self,
        qualification: Qualification,
        today: NaiveDate,
    ) -> Result<QualificationView, ServiceError> {
        let company = self
            .directory
            .fetch_company(qualification.company_id)?
            .ok_or(ServiceError::NotFound)?;
        let agency_name = match qualification.agency_id {
            Some(agency_id) => self.directory.fetch_agency(agency_id)?.map(|a| a.name),
            None => None,
        };
        let industries = self.repository.industries_of(qualification.id)?;
        let status = qualification.status(today, &self.policy);

        Ok(QualificationView {
            qualification,
            company_name: company.name,
            agency_name,
            status,
            industries,
        })
    }

    // --- industries ------------------------------------------------------

    fn industry_from_draft(
        &self,
        id: IndustryId,
        qualification_id: QualificationId,
        draft: IndustryDraft,
    ) -> Result<QualificationIndustry, ServiceError> {
        let industry_name = draft.industry_name.trim().to_string();
        if industry_name.is_empty() {
            return Err(validation("industry name", "must not be empty"));
        }

        Ok(QualificationIndustry {
            id,
            qualification_id,
            industry_name,
            grade: normalize_text(draft.grade),
            notes: normalize_text(draft.notes),
            total_score: draft.total_score.as_deref().and_then(parse_total_score),
            rating: normalize_text(draft.rating),
        })
    }

    pub fn add_industry(
        &self,
        qualification_id: QualificationId,
        draft: IndustryDraft,
    ) -> Result<QualificationIndustry, ServiceError> {
        self.repository
            .fetch(qualification_id)?
            .ok_or(ServiceError::NotFound)?;
        let industry = self.industry_from_draft(IndustryId(0), qualification_id, draft)?;
        Ok(self.repository.insert_industry(industry)?)
    }

    pub fn update_industry(
        &self,
        id: IndustryId,
        draft: IndustryDraft,
    ) -> Result<QualificationIndustry, ServiceError> {
        let existing = self
            .repository
            .fetch_industry(id)?
            .ok_or(ServiceError::NotFound)?;
        let updated = self.industry_from_draft(id, existing.qualification_id, draft)?;
        self.repository.update_industry(updated.clone())?;
        Ok(updated)
    }

    /// Scoped to the parent qualification only; returns the parent id.
    pub fn delete_industry(&self, id: IndustryId) -> Result<QualificationId, ServiceError> {
        let existing = self
            .repository
            .fetch_industry(id)?
            .ok_or(ServiceError::NotFound)?;
        self.repository.delete_industry(id)?;
        Ok(existing.qualification_id)
    }

    // --- search and csv --------------------------------------------------

    pub fn search(
        &self,
        query: &SearchQuery,
        today: NaiveDate,
    ) -> Result<Vec<QualificationView>, ServiceError> {
        let candidates = match query.company {
            Some(company) => {
                self.directory
                    .fetch_company(company)?
                    .ok_or(ServiceError::NotFound)?;
                self.repository.list_by_company(company)?
            }
            None => self.repository.list_all()?,
        };

        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        let mut views = Vec::new();
        for qualification in candidates {
            let view = self.build_view(qualification, today)?;

            if let Some(ref needle) = keyword {
                if !view_matches(&view, needle) {
                    continue;
                }
            }
            if let Some(status) = query.status {
                if view.status.status != status {
                    continue;
                }
            }
            views.push(view);
        }
        Ok(views)
    }

    /// Builds the downloadable CSV for the given filter. Rows missing any
    /// of the three dates are excluded and counted, not exported half-empty.
    pub fn export_csv(
        &self,
        query: &SearchQuery,
        today: NaiveDate,
    ) -> Result<ExportOutcome, ServiceError> {
        let views = self.search(query, today)?;
        let outcome = export_views(&views)?;
        if outcome.skipped > 0 {
            warn!(
                skipped = outcome.skipped,
                "export excluded rows with missing dates"
            );
        }
        Ok(outcome)
    }

    /// Best-effort import scoped to one company. Each row is validated in
    /// full before it is written; a failed row is reported and skipped, and
    /// the rest of the batch continues.
    pub fn import_csv(
        &self,
        company_id: CompanyId,
        bytes: &[u8],
        actor: &str,
    ) -> Result<ImportReport, ServiceError> {
        self.directory
            .fetch_company(company_id)?
            .ok_or(ServiceError::NotFound)?;

        let rows = parse_import(bytes)?;

        let mut imported = 0usize;
        let mut errors = Vec::new();

        for row in rows {
            match row {
                Ok(parsed) => {
                    let line = parsed.line;
                    match self.import_row(company_id, parsed, actor) {
                        Ok(()) => imported += 1,
                        Err(err) => errors.push(format!("row {line}: {err}")),
                    }
                }
                Err(err) => errors.push(err.to_string()),
            }
        }

        info!(
            company = company_id.0,
            imported,
            rejected = errors.len(),
            "csv import finished"
        );

        Ok(ImportReport { imported, errors })
    }

    fn import_row(
        &self,
        company_id: CompanyId,
        parsed: super::csv::ParsedRow,
        actor: &str,
    ) -> Result<(), ServiceError> {
        let mut draft = parsed.draft;
        if let Some(agency_name) = parsed.agency_name {
            draft.agency_id = Some(self.find_or_create_agency(&agency_name)?.id);
        }
        self.create_qualification(company_id, draft, actor)?;
        Ok(())
    }
}

fn view_matches(view: &QualificationView, needle: &str) -> bool {
    let q = &view.qualification;
    let haystacks = [
        Some(view.company_name.as_str()),
        view.agency_name.as_deref(),
        Some(q.registration_number.as_str()),
        q.application_status.as_deref(),
        q.notes.as_deref(),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(needle))
}
