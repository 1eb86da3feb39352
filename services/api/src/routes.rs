use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use qualtrack::accounts::{account_router, AccountService};
use qualtrack::assist::{AnswerGateway, AssistError};
use qualtrack::memory::InMemoryStore;
use qualtrack::qualifications::{qualification_router, QualificationApi};
use serde::Deserialize;
use serde_json::json;

use crate::infra::AppState;

type Store = InMemoryStore;

pub(crate) fn build_router(
    qualifications: Arc<QualificationApi<Store, Store>>,
    accounts: Arc<AccountService<Store, Store>>,
) -> Router {
    qualification_router(qualifications)
        .merge(account_router(accounts))
        .route("/api/v1/assist", axum::routing::post(assist_endpoint))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssistRequest {
    question: String,
}

/// Forwards a question to the external Q&A provider. Every failure is
/// downgraded to a message payload; the request itself never crashes.
pub(crate) async fn assist_endpoint(
    Extension(gateway): Extension<Arc<dyn AnswerGateway>>,
    Json(request): Json<AssistRequest>,
) -> impl IntoResponse {
    match gateway.ask(&request.question).await {
        Ok(answer) => (StatusCode::OK, Json(json!({ "answer": answer }))),
        Err(err) => {
            let status = match &err {
                AssistError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
                AssistError::EmptyQuestion => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_GATEWAY,
            };
            tracing::warn!(%err, "assist request failed");
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::util::ServiceExt;

    struct CannedGateway(Result<&'static str, AssistError>);

    #[async_trait]
    impl AnswerGateway for CannedGateway {
        async fn ask(&self, _question: &str) -> Result<String, AssistError> {
            match &self.0 {
                Ok(answer) => Ok(answer.to_string()),
                Err(AssistError::MissingCredential) => Err(AssistError::MissingCredential),
                Err(_) => Err(AssistError::Transport("canned failure".to_string())),
            }
        }
    }

    fn assist_app(gateway: CannedGateway) -> Router {
        Router::new()
            .route("/api/v1/assist", axum::routing::post(assist_endpoint))
            .layer(Extension(Arc::new(gateway) as Arc<dyn AnswerGateway>))
    }

    async fn ask(app: &Router, question: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/assist")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "question": question }).to_string()))
            .expect("request built");
        let response = app.clone().oneshot(request).await.expect("handled");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn assist_returns_the_provider_answer() {
        let app = assist_app(CannedGateway(Ok("renew ninety days ahead")));
        let (status, body) = ask(&app, "when should we renew?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "renew ninety days ahead");
    }

    #[tokio::test]
    async fn missing_credential_is_a_distinct_visible_condition() {
        let app = assist_app(CannedGateway(Err(AssistError::MissingCredential)));
        let (status, body) = ask(&app, "anything").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"]
            .as_str()
            .expect("message")
            .contains("credential"));
    }

    #[tokio::test]
    async fn provider_failure_is_downgraded_not_fatal() {
        let app = assist_app(CannedGateway(Err(AssistError::Transport(String::new()))));
        let (status, body) = ask(&app, "anything").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }
}
