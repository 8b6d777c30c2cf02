use crate::cli::ServeArgs;
use crate::infra::{open_portal, AppState};
use crate::routes::ops_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sinag::config::AppConfig;
use sinag::error::AppError;
use sinag::{portal_router, telemetry, PortalState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let portal = PortalState::new(open_portal(&config)?);
    let app = portal_router(portal)
        .merge(ops_routes())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.storage.database_path.display(),
        "internship portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
