use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tubely_server=info,sqlx=warn,sea_orm=warn,tower_http=warn";

/// Install the global subscriber.
///
/// - `RUST_LOG` overrides the filter.
/// - `RUST_LOG_FORMAT=json` switches to flattened JSON lines.
/// - `OTEL_EXPORTER_OTLP_ENDPOINT` enables span export over gRPC.
pub fn init_telemetry(service_name: &str) -> anyhow::Result<()> {
    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|f| f == "json");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let otel_layer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(service_name, endpoint)?)),
        Err(_) => None,
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    Ok(())
}

fn otlp_tracer(service_name: &str, endpoint: String) -> anyhow::Result<sdktrace::Tracer> {
    let resource = Resource::new(vec![KeyValue::new(
        resource::SERVICE_NAME,
        service_name.to_string(),
    )]);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::config()
                .with_resource(resource)
                .with_sampler(sdktrace::Sampler::AlwaysOn),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;
    Ok(tracer)
}
