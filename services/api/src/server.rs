use crate::cli::ServeArgs;
use crate::infra::{build_phone_verifier, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use merchant_onboarding::config::AppConfig;
use merchant_onboarding::error::AppError;
use merchant_onboarding::onboarding::{
    ApiKeyAuthorizer, ApplicationStore, InMemoryApplicationRepository,
};
use merchant_onboarding::telemetry;
use merchant_onboarding::validation::{cancellation_pair, CancellationHandle};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let phone_verifier = build_phone_verifier(&config.phone_lookup)?;
    if !phone_verifier.is_configured() {
        info!("carrier lookup not configured; phone checks run locally only");
    }

    let authorizer = ApiKeyAuthorizer::from_config(&config.auth);
    if config.auth.api_key.is_none() {
        warn!("APP_API_KEY is not set; application writes will be rejected");
    }

    let (shutdown_handle, shutdown) = cancellation_pair();
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        phone_verifier: Arc::new(phone_verifier),
        shutdown,
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let store = Arc::new(ApplicationStore::new(repository));

    let app = with_application_routes(store, Arc::new(authorizer))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "merchant onboarding service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_handle, readiness_flag))
        .await?;
    Ok(())
}

async fn shutdown_signal(handle: CancellationHandle, readiness: Arc<std::sync::atomic::AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("shutdown requested; cancelling outstanding carrier lookups");
    readiness.store(false, Ordering::Release);
    handle.cancel();
}
