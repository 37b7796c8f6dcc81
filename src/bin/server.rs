use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tubely_server::{
    api,
    config::Config,
    media::{Ffmpeg, Ffprobe},
    state::AppState,
    storage::ObjectStorage,
    store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tubely_server::telemetry::init_telemetry("tubely-server")?;

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection (migrations run on connect)
    let db = store::connect(&config.database_url).await?;

    let objects = ObjectStorage::s3(
        &config.s3_bucket,
        &config.s3_region,
        config.s3_endpoint.as_deref(),
    )?;

    tubely_server::metrics::init_metrics(&db).await;

    let port = config.port;
    let state = AppState::new(
        config,
        Arc::new(db),
        objects,
        Arc::new(Ffprobe::default()),
        Arc::new(Ffmpeg),
    );
    state.assets.ensure_root().await?;

    let app = api::router(state)
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
