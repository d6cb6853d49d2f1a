use std::time::Duration;

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use opentelemetry::global;
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
};
use tokio::runtime::Runtime;

use crate::config::{ExportMode, LoadgenConfig};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

static METER_PROVIDER: OnceCell<SdkMeterProvider> = OnceCell::new();

/// Builds the pipeline, entering `runtime` only for the gRPC exporter.
///
/// The tonic channel spawns its connection task on the ambient runtime, while
/// the HTTP exporter creates a blocking client that must not be built inside
/// one.
pub fn init_meter_provider_on(cfg: &LoadgenConfig, runtime: &Runtime) -> Result<SdkMeterProvider> {
    match cfg.export_mode {
        ExportMode::OtlpGrpc => {
            let _guard = runtime.enter();
            init_meter_provider(cfg)
        }
        ExportMode::OtlpHttp | ExportMode::JsonStdout => init_meter_provider(cfg),
    }
}

/// Builds the OTLP metric pipeline and installs it as the global provider.
///
/// The gRPC exporter requires an entered tokio runtime; the HTTP exporter
/// requires the opposite. See [`init_meter_provider_on`].
pub fn init_meter_provider(cfg: &LoadgenConfig) -> Result<SdkMeterProvider> {
    let exporter = match cfg.export_mode {
        ExportMode::OtlpHttp => MetricExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(cfg.endpoint.clone())
            .with_headers(cfg.headers.clone())
            .with_timeout(EXPORT_TIMEOUT)
            .build(),
        ExportMode::OtlpGrpc => {
            if !cfg.headers.is_empty() {
                tracing::warn!("OTLP_HEADERS are only applied to the otlp-http exporter; ignoring");
            }
            MetricExporter::builder()
                .with_tonic()
                .with_endpoint(cfg.endpoint.clone())
                .with_timeout(EXPORT_TIMEOUT)
                .build()
        }
        ExportMode::JsonStdout => bail!("json-stdout export does not use an OTLP pipeline"),
    }
    .with_context(|| format!("failed to build OTLP metric exporter for {}", cfg.endpoint))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(cfg.export_interval)
        .build();

    let resource = Resource::builder()
        .with_service_name(cfg.service_name.clone())
        .build();

    let provider = SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    if METER_PROVIDER.set(provider.clone()).is_err() {
        tracing::warn!("meter provider already initialized; skipping overwrite");
    }
    global::set_meter_provider(provider.clone());

    tracing::info!(
        endpoint = %cfg.endpoint,
        service = %cfg.service_name,
        interval_ms = cfg.export_interval.as_millis() as u64,
        "otlp metric pipeline ready"
    );
    Ok(provider)
}

/// Meter named after the configured instrumentation scope.
pub fn meter(provider: &SdkMeterProvider, cfg: &LoadgenConfig) -> Meter {
    let scope = InstrumentationScope::builder(cfg.meter_name.clone())
        .with_version(env!("CARGO_PKG_VERSION"))
        .build();
    provider.meter_with_scope(scope)
}

/// Flushes pending metrics and stops the periodic reader.
pub fn shutdown() {
    if let Some(provider) = METER_PROVIDER.get()
        && let Err(err) = provider.shutdown()
    {
        tracing::warn!("meter provider shutdown failed: {err}");
    }
}
