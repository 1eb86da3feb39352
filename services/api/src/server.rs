use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use qualtrack::accounts::AccountService;
use qualtrack::assist::{AnswerGateway, HttpAnswerGateway};
use qualtrack::config::AppConfig;
use qualtrack::error::AppError;
use qualtrack::memory::InMemoryStore;
use qualtrack::notify::ConsoleMailTransport;
use qualtrack::qualifications::{QualificationApi, QualificationService, StatusPolicy};
use qualtrack::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{seed_admin, AppState};
use crate::routes::build_router;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = InMemoryStore::new();

    let accounts = Arc::new(AccountService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));
    seed_admin(&accounts)?;

    let policy = StatusPolicy {
        renewal_notice_days: config.qualifications.renewal_notice_days,
    };
    let service = Arc::new(QualificationService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        policy,
    ));
    let qualifications = Arc::new(QualificationApi {
        service,
        mailer: Arc::new(ConsoleMailTransport),
        settings: Arc::new(store),
    });

    let gateway: Arc<dyn AnswerGateway> = Arc::new(HttpAnswerGateway::new(&config.assist)?);

    let app = build_router(qualifications, accounts)
        .layer(Extension(app_state))
        .layer(Extension(gateway))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "qualification tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
