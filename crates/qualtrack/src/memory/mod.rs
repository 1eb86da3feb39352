//! In-memory reference store. Backs the binary and the test suites; each
//! trait method takes the lock once, so a failed call leaves no partial
//! write behind.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::accounts::domain::{User, UserId};
use crate::accounts::repository::{SettingsRepository, UserRepository};
use crate::qualifications::domain::{
    AdminAgency, AgencyId, Company, CompanyId, IndustryId, Qualification, QualificationId,
    QualificationIndustry,
};
use crate::qualifications::repository::{
    CompanyDirectory, QualificationRepository, RepositoryError,
};

#[derive(Debug, Default)]
struct StoreState {
    companies: BTreeMap<u64, Company>,
    agencies: BTreeMap<u64, AdminAgency>,
    qualifications: BTreeMap<u64, Qualification>,
    industries: BTreeMap<u64, QualificationIndustry>,
    users: BTreeMap<u64, User>,
    settings: BTreeMap<String, String>,
    next_id: u64,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Transactional-enough store for a single process: every operation holds
/// the one lock for its whole duration.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex poisoned")
    }
}

impl CompanyDirectory for InMemoryStore {
    fn insert_company(&self, mut company: Company) -> Result<Company, RepositoryError> {
        let mut state = self.lock();
        if state.companies.values().any(|c| c.name == company.name) {
            return Err(RepositoryError::Conflict);
        }
        let id = state.next_id();
        company.id = CompanyId(id);
        state.companies.insert(id, company.clone());
        Ok(company)
    }

    fn update_company(&self, company: Company) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if !state.companies.contains_key(&company.id.0) {
            return Err(RepositoryError::NotFound);
        }
        state.companies.insert(company.id.0, company);
        Ok(())
    }

    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.lock().companies.get(&id.0).cloned())
    }

    fn fetch_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        Ok(self
            .lock()
            .companies
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self.lock().companies.values().cloned().collect())
    }

    fn delete_company(&self, id: CompanyId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state
            .companies
            .remove(&id.0)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn insert_agency(&self, mut agency: AdminAgency) -> Result<AdminAgency, RepositoryError> {
        let mut state = self.lock();
        if state.agencies.values().any(|a| a.name == agency.name) {
            return Err(RepositoryError::Conflict);
        }
        let id = state.next_id();
        agency.id = AgencyId(id);
        state.agencies.insert(id, agency.clone());
        Ok(agency)
    }

    fn fetch_agency(&self, id: AgencyId) -> Result<Option<AdminAgency>, RepositoryError> {
        Ok(self.lock().agencies.get(&id.0).cloned())
    }

    fn fetch_agency_by_name(&self, name: &str) -> Result<Option<AdminAgency>, RepositoryError> {
        Ok(self
            .lock()
            .agencies
            .values()
            .find(|a| a.name == name)
            .cloned())
    }

    fn list_agencies(&self) -> Result<Vec<AdminAgency>, RepositoryError> {
        Ok(self.lock().agencies.values().cloned().collect())
    }
}

impl QualificationRepository for InMemoryStore {
    fn insert(&self, mut qualification: Qualification) -> Result<Qualification, RepositoryError> {
        let mut state = self.lock();
        if !state.companies.contains_key(&qualification.company_id.0) {
            return Err(RepositoryError::NotFound);
        }
        let id = state.next_id();
        qualification.id = QualificationId(id);
        state.qualifications.insert(id, qualification.clone());
        Ok(qualification)
    }

    fn update(&self, qualification: Qualification) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if !state.qualifications.contains_key(&qualification.id.0) {
            return Err(RepositoryError::NotFound);
        }
        state.qualifications.insert(qualification.id.0, qualification);
        Ok(())
    }

    fn fetch(&self, id: QualificationId) -> Result<Option<Qualification>, RepositoryError> {
        Ok(self.lock().qualifications.get(&id.0).cloned())
    }

    fn delete(&self, id: QualificationId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state
            .qualifications
            .remove(&id.0)
            .ok_or(RepositoryError::NotFound)?;
        state
            .industries
            .retain(|_, industry| industry.qualification_id != id);
        Ok(())
    }

    fn list_by_company(&self, company: CompanyId) -> Result<Vec<Qualification>, RepositoryError> {
        Ok(self
            .lock()
            .qualifications
            .values()
            .filter(|q| q.company_id == company)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Qualification>, RepositoryError> {
        Ok(self.lock().qualifications.values().cloned().collect())
    }

    fn count_by_company(&self, company: CompanyId) -> Result<usize, RepositoryError> {
        Ok(self
            .lock()
            .qualifications
            .values()
            .filter(|q| q.company_id == company)
            .count())
    }

    fn insert_industry(
        &self,
        mut industry: QualificationIndustry,
    ) -> Result<QualificationIndustry, RepositoryError> {
        let mut state = self.lock();
        if !state
            .qualifications
            .contains_key(&industry.qualification_id.0)
        {
            return Err(RepositoryError::NotFound);
        }
        let id = state.next_id();
        industry.id = IndustryId(id);
        state.industries.insert(id, industry.clone());
        Ok(industry)
    }

    fn update_industry(&self, industry: QualificationIndustry) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if !state.industries.contains_key(&industry.id.0) {
            return Err(RepositoryError::NotFound);
        }
        state.industries.insert(industry.id.0, industry);
        Ok(())
    }

    fn fetch_industry(
        &self,
        id: IndustryId,
    ) -> Result<Option<QualificationIndustry>, RepositoryError> {
        Ok(self.lock().industries.get(&id.0).cloned())
    }

    fn delete_industry(&self, id: IndustryId) -> Result<(), RepositoryError> {
        self.lock()
            .industries
            .remove(&id.0)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn industries_of(
        &self,
        qualification: QualificationId,
    ) -> Result<Vec<QualificationIndustry>, RepositoryError> {
        Ok(self
            .lock()
            .industries
            .values()
            .filter(|i| i.qualification_id == qualification)
            .cloned()
            .collect())
    }
}

impl UserRepository for InMemoryStore {
    fn insert_user(&self, mut user: User) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict);
        }
        let id = state.next_id();
        user.id = UserId(id);
        state.users.insert(id, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(&id.0).cloned())
    }

    fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

impl SettingsRepository for InMemoryStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.lock().settings.get(key).cloned())
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.lock().settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
