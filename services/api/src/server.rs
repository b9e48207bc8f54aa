use crate::cli::ServeArgs;
use crate::infra::{demo_catalog, AppState, ConfiguredSettingsStore};
use crate::routes::with_discount_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use conditional_discount::config::AppConfig;
use conditional_discount::discounts::DiscountService;
use conditional_discount::error::AppError;
use conditional_discount::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let settings = ConfiguredSettingsStore::from_config(&config.discounts);
    let settings_backend = settings.describe();
    let discount_service = Arc::new(DiscountService::new(
        Arc::new(settings),
        Arc::new(demo_catalog()),
        config.discounts.policy,
    ));

    let app = with_discount_routes(discount_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy = %config.discounts.policy,
        settings = %settings_backend,
        "conditional discount service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
