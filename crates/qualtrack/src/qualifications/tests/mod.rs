//! Behavioral tests for the qualification service and CSV pipeline,
//! exercised through the public service facade against the in-memory store.

mod csv;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::memory::InMemoryStore;
use crate::qualifications::domain::{CompanyDraft, CompanyId, QualificationDraft};
use crate::qualifications::service::QualificationService;
use crate::qualifications::status::StatusPolicy;

pub(super) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn service() -> QualificationService<InMemoryStore, InMemoryStore> {
    let store = InMemoryStore::new();
    QualificationService::new(
        Arc::new(store.clone()),
        Arc::new(store),
        StatusPolicy::default(),
    )
}

pub(super) fn company(
    service: &QualificationService<InMemoryStore, InMemoryStore>,
    name: &str,
) -> CompanyId {
    service
        .create_company(CompanyDraft {
            name: name.to_string(),
            ..CompanyDraft::default()
        })
        .expect("company created")
        .id
}

pub(super) fn full_draft(registration: &str) -> QualificationDraft {
    QualificationDraft {
        registration_number: registration.to_string(),
        valid_from: Some(day(2025, 4, 1)),
        valid_until: Some(day(2027, 3, 31)),
        next_application_on: Some(day(2027, 1, 15)),
        application_status: Some("awaiting action".to_string()),
        notes: Some("renewal handled by head office".to_string()),
        notification_url: Some("https://example.com/notice.pdf".to_string()),
        ..QualificationDraft::default()
    }
}
