use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use qualtrack::accounts::{AccountError, AccountService, NewUser};
use qualtrack::memory::InMemoryStore;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{value}' is not a YYYY-MM-DD date"))
}

/// Seeds the initial administrator from `ADMIN_USERNAME`/`ADMIN_PASSWORD`.
/// Without a password the store starts empty and login stays unusable,
/// which is the safer default.
pub(crate) fn seed_admin(
    accounts: &AccountService<InMemoryStore, InMemoryStore>,
) -> Result<(), AccountError> {
    let Ok(password) = std::env::var("ADMIN_PASSWORD") else {
        warn!("ADMIN_PASSWORD not set; no administrator account seeded");
        return Ok(());
    };
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());

    accounts.register(NewUser {
        username: username.clone(),
        email,
        password,
        is_admin: true,
    })?;
    info!(%username, "administrator account seeded");
    Ok(())
}
