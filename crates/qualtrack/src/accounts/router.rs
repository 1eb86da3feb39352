use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::NewUser;
use super::repository::{SettingsRepository, UserRepository};
use super::service::{AccountError, AccountService};

/// Router builder for login, user administration, and the notification
/// address setting.
pub fn account_router<U, S>(service: Arc<AccountService<U, S>>) -> Router
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    Router::new()
        .route("/api/v1/auth/login", post(login::<U, S>))
        .route("/api/v1/users", post(register::<U, S>))
        .route(
            "/api/v1/settings/notification-email",
            get(get_notification_email::<U, S>).put(put_notification_email::<U, S>),
        )
        .with_state(service)
}

fn error_response(err: AccountError) -> Response {
    let status = match &err {
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::DuplicateUsername => StatusCode::CONFLICT,
        AccountError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::NotAdmin => StatusCode::FORBIDDEN,
        AccountError::Password(_) | AccountError::Repository(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login<U, S>(
    State(service): State<Arc<AccountService<U, S>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    match service.authenticate(&request.username, &request.password) {
        Ok(user) => Json(user).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    actor: String,
    #[serde(flatten)]
    user: NewUser,
}

async fn register<U, S>(
    State(service): State<Arc<AccountService<U, S>>>,
    Json(request): Json<RegisterRequest>,
) -> Response
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    // Only admins may create accounts.
    match service.get_user(&request.actor) {
        Ok(Some(actor)) if actor.is_admin => {}
        Ok(_) => return error_response(AccountError::NotAdmin),
        Err(err) => return error_response(err),
    }

    match service.register(request.user) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_notification_email<U, S>(
    State(service): State<Arc<AccountService<U, S>>>,
) -> Response
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    match service.admin_notification_email() {
        Ok(email) => Json(json!({ "email": email })).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct NotificationEmailRequest {
    actor: String,
    email: String,
}

async fn put_notification_email<U, S>(
    State(service): State<Arc<AccountService<U, S>>>,
    Json(request): Json<NotificationEmailRequest>,
) -> Response
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    match service.set_admin_notification_email(&request.actor, &request.email) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}
