use anyhow::Result;
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

/// Install the tracing subscriber: fmt output filtered by `RUST_LOG`
/// (default `info`), plus OTLP span export when `OTLP_ENDPOINT` is set.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(service_name: &'static str) -> Result<()> {
    if INIT.set(()).is_err() {
        return Ok(());
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter)?)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    match std::env::var("OTLP_ENDPOINT").ok() {
        Some(endpoint) => {
            let tracer = span_provider(service_name, &endpoint)?.tracer(service_name);
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
        }
        None => registry.try_init()?,
    }
    Ok(())
}

fn span_provider(
    service_name: &'static str,
    endpoint: &str,
) -> Result<sdk::trace::SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()?;
    Ok(sdk::trace::SdkTracerProvider::builder()
        .with_resource(Resource::builder().with_service_name(service_name).build())
        .with_batch_exporter(exporter)
        .build())
}
