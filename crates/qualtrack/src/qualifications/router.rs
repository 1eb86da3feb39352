use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CompanyDraft, CompanyId, IndustryDraft, IndustryId, QualificationDraft, QualificationId};
use super::repository::{CompanyDirectory, QualificationRepository};
use super::service::{QualificationService, SearchQuery, ServiceError};
use super::status::StatusLabel;
use crate::accounts::repository::{SettingsRepository, ADMIN_NOTIFY_EMAIL};
use crate::notify::{MailMessage, MailTransport};

/// Handler state for the qualification surface. The mail transport and
/// settings store ride along so the import endpoint can notify the admin
/// contact without reaching into ambient state.
pub struct QualificationApi<D, Q> {
    pub service: Arc<QualificationService<D, Q>>,
    pub mailer: Arc<dyn MailTransport>,
    pub settings: Arc<dyn SettingsRepository>,
}

/// Router builder exposing CRUD, search, and the CSV surface.
pub fn qualification_router<D, Q>(api: Arc<QualificationApi<D, Q>>) -> Router
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/companies",
            get(list_companies::<D, Q>).post(create_company::<D, Q>),
        )
        .route(
            "/api/v1/companies/:company_id",
            get(get_company::<D, Q>)
                .put(update_company::<D, Q>)
                .delete(delete_company::<D, Q>),
        )
        .route(
            "/api/v1/agencies",
            get(list_agencies::<D, Q>).post(create_agency::<D, Q>),
        )
        .route(
            "/api/v1/companies/:company_id/qualifications",
            get(search_company::<D, Q>).post(create_qualification::<D, Q>),
        )
        .route(
            "/api/v1/companies/:company_id/qualifications/export",
            get(export_csv::<D, Q>),
        )
        .route(
            "/api/v1/companies/:company_id/qualifications/import",
            post(import_csv::<D, Q>),
        )
        .route("/api/v1/qualifications", get(search_all::<D, Q>))
        .route(
            "/api/v1/qualifications/:qualification_id",
            get(get_qualification::<D, Q>)
                .put(update_qualification::<D, Q>)
                .delete(delete_qualification::<D, Q>),
        )
        .route(
            "/api/v1/qualifications/:qualification_id/industries",
            post(add_industry::<D, Q>),
        )
        .route(
            "/api/v1/industries/:industry_id",
            put(update_industry::<D, Q>).delete(delete_industry::<D, Q>),
        )
        .with_state(api)
}

fn error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::CompanyInUse { .. } => StatusCode::CONFLICT,
        ServiceError::ImportUnreadable(_) => StatusCode::BAD_REQUEST,
        ServiceError::Repository(_) | ServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    status: Option<String>,
    /// Reference date override, mostly for tests; defaults to local today.
    #[serde(default)]
    today: Option<NaiveDate>,
}

impl SearchParams {
    fn into_query(self, company: Option<CompanyId>) -> Result<(SearchQuery, NaiveDate), Response> {
        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => match StatusLabel::parse_filter(raw) {
                Some(label) => Some(label),
                None => {
                    return Err((
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(json!({ "error": format!("unknown status filter '{raw}'") })),
                    )
                        .into_response())
                }
            },
        };
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        Ok((
            SearchQuery {
                company,
                keyword: self.keyword,
                status,
            },
            today,
        ))
    }
}

/// Mutation payloads carry the acting username explicitly.
#[derive(Debug, Deserialize)]
struct QualificationRequest {
    actor: String,
    #[serde(flatten)]
    draft: QualificationDraft,
}

#[derive(Debug, Deserialize)]
struct AgencyRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ImportParams {
    actor: String,
}

// --- companies -----------------------------------------------------------

async fn create_company<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Json(draft): Json<CompanyDraft>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.create_company(draft) {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_companies<D, Q>(State(api): State<Arc<QualificationApi<D, Q>>>) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.list_companies() {
        Ok(companies) => Json(companies).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_company<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.get_company(CompanyId(company_id)) {
        Ok(company) => Json(company).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_company<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
    Json(draft): Json<CompanyDraft>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.update_company(CompanyId(company_id), draft) {
        Ok(company) => Json(company).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_company<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.delete_company(CompanyId(company_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

// --- agencies ------------------------------------------------------------

async fn create_agency<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Json(request): Json<AgencyRequest>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.create_agency(&request.name) {
        Ok(agency) => (StatusCode::CREATED, Json(agency)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_agencies<D, Q>(State(api): State<Arc<QualificationApi<D, Q>>>) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.list_agencies() {
        Ok(agencies) => Json(agencies).into_response(),
        Err(err) => error_response(err),
    }
}

// --- qualifications ------------------------------------------------------

async fn create_qualification<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
    Json(request): Json<QualificationRequest>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api
        .service
        .create_qualification(CompanyId(company_id), request.draft, &request.actor)
    {
        Ok(qualification) => (StatusCode::CREATED, Json(qualification)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_qualification<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(qualification_id): Path<u64>,
    Json(request): Json<QualificationRequest>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.update_qualification(
        QualificationId(qualification_id),
        request.draft,
        &request.actor,
    ) {
        Ok(qualification) => Json(qualification).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_qualification<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(qualification_id): Path<u64>,
    Query(params): Query<SearchParams>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let today = params.today.unwrap_or_else(|| Local::now().date_naive());
    match api
        .service
        .get_qualification(QualificationId(qualification_id), today)
    {
        Ok(view) => Json(view).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_qualification<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(qualification_id): Path<u64>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api
        .service
        .delete_qualification(QualificationId(qualification_id))
    {
        Ok(company_id) => Json(json!({ "company_id": company_id })).into_response(),
        Err(err) => error_response(err),
    }
}

// --- industries ----------------------------------------------------------

async fn add_industry<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(qualification_id): Path<u64>,
    Json(draft): Json<IndustryDraft>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api
        .service
        .add_industry(QualificationId(qualification_id), draft)
    {
        Ok(industry) => (StatusCode::CREATED, Json(industry)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_industry<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(industry_id): Path<u64>,
    Json(draft): Json<IndustryDraft>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.update_industry(IndustryId(industry_id), draft) {
        Ok(industry) => Json(industry).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_industry<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(industry_id): Path<u64>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    match api.service.delete_industry(IndustryId(industry_id)) {
        Ok(qualification_id) => {
            Json(json!({ "qualification_id": qualification_id })).into_response()
        }
        Err(err) => error_response(err),
    }
}

// --- search --------------------------------------------------------------

async fn search_company<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
    Query(params): Query<SearchParams>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let (query, today) = match params.into_query(Some(CompanyId(company_id))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    match api.service.search(&query, today) {
        Ok(views) => Json(views).into_response(),
        Err(err) => error_response(err),
    }
}

async fn search_all<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let (query, today) = match params.into_query(None) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    match api.service.search(&query, today) {
        Ok(views) => Json(views).into_response(),
        Err(err) => error_response(err),
    }
}

// --- csv -----------------------------------------------------------------

/// RFC 5987 percent-encoding for the download filename, so non-ASCII
/// company names survive the Content-Disposition header.
fn rfc5987_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(*byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

async fn export_csv<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
    Query(params): Query<SearchParams>,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let company = match api.service.get_company(CompanyId(company_id)) {
        Ok(company) => company,
        Err(err) => return error_response(err),
    };

    let (query, today) = match params.into_query(Some(CompanyId(company_id))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let outcome = match api.service.export_csv(&query, today) {
        Ok(outcome) => outcome,
        Err(err) => return error_response(err),
    };

    let filename = format!("qualifications-{}.csv", company.name);
    let disposition = format!(
        "attachment; filename=\"qualifications-{}.csv\"; filename*=UTF-8''{}",
        company.id.0,
        rfc5987_encode(&filename)
    );
    let content_type = format!("text/csv; charset={}", outcome.payload.charset.mime_name());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static("x-export-skipped"),
                outcome.skipped.to_string(),
            ),
        ],
        outcome.payload.bytes,
    )
        .into_response()
}

async fn import_csv<D, Q>(
    State(api): State<Arc<QualificationApi<D, Q>>>,
    Path(company_id): Path<u64>,
    Query(params): Query<ImportParams>,
    body: axum::body::Bytes,
) -> Response
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let report = match api
        .service
        .import_csv(CompanyId(company_id), &body, &params.actor)
    {
        Ok(report) => report,
        Err(err) => return error_response(err),
    };

    // Admin notification is best-effort; a mail failure becomes a message
    // in the response, never a failed import.
    let notice = notify_admin(&api, company_id, &report).await;

    Json(json!({
        "imported": report.imported,
        "errors": report.errors,
        "notice": notice,
    }))
    .into_response()
}

async fn notify_admin<D, Q>(
    api: &QualificationApi<D, Q>,
    company_id: u64,
    report: &super::service::ImportReport,
) -> Option<String>
where
    D: CompanyDirectory + 'static,
    Q: QualificationRepository + 'static,
{
    let recipient = match api.settings.get_setting(ADMIN_NOTIFY_EMAIL) {
        Ok(Some(address)) => address,
        Ok(None) => return Some("no admin notification address configured".to_string()),
        Err(err) => return Some(format!("could not read notification settings: {err}")),
    };

    let message = MailMessage {
        to: recipient,
        subject: format!("CSV import finished for company {company_id}"),
        body: format!(
            "Imported {} row(s); {} row(s) rejected.",
            report.imported,
            report.errors.len()
        ),
    };

    match api.mailer.send(message).await {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(%err, "admin notification mail failed");
            Some(format!("admin notification failed: {err}"))
        }
    }
}
