use std::future::pending;
use std::sync::Arc;

use anyhow::{Context, Result};
use metric_loadgen::{ExportMode, Loadgen, LoadgenConfig, LoggingConfig, ProcProbe};

fn main() -> Result<()> {
    let cfg = LoadgenConfig::from_env().context("invalid configuration")?;
    metric_loadgen::init_logging(&LoggingConfig {
        service_name: cfg.service_name.clone(),
    })?;

    let loadgen = Loadgen::new(cfg, Arc::new(ProcProbe))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    match loadgen.config().export_mode {
        ExportMode::JsonStdout => runtime.block_on(run_json_stdout(&loadgen)),
        ExportMode::OtlpHttp | ExportMode::OtlpGrpc => run_otlp(&loadgen, &runtime),
    }?;

    metric_loadgen::shutdown();
    tracing::info!("shutdown complete");
    Ok(())
}

async fn run_json_stdout(loadgen: &Loadgen) -> Result<()> {
    let scheduler = loadgen.export_scheduler();
    let event_loop = loadgen.event_loop(loadgen.log_recorder());

    tokio::select! {
        _ = scheduler.run(pending::<()>()) => {}
        _ = event_loop.run(pending::<()>()) => {}
        signal = tokio::signal::ctrl_c() => signal.context("failed to listen for ctrl-c")?,
    }
    Ok(())
}

#[cfg(feature = "otlp")]
fn run_otlp(loadgen: &Loadgen, runtime: &tokio::runtime::Runtime) -> Result<()> {
    use metric_loadgen::{metrics, otlp};

    let provider = otlp::init_meter_provider_on(loadgen.config(), runtime)?;
    let meter = otlp::meter(&provider, loadgen.config());

    let _gauges: Vec<_> = loadgen
        .gauges()
        .iter()
        .map(|gauge| metrics::register_gauge(&meter, Arc::clone(gauge)))
        .collect();
    let recorder =
        metrics::OtelRequestRecorder::new(&meter, loadgen.config(), loadgen.boundaries().to_vec());
    let event_loop = loadgen.event_loop(recorder);

    runtime.block_on(async {
        tokio::select! {
            _ = event_loop.run(pending::<()>()) => {}
            signal = tokio::signal::ctrl_c() => signal.context("failed to listen for ctrl-c")?,
        }
        Ok::<_, anyhow::Error>(())
    })
}

#[cfg(not(feature = "otlp"))]
fn run_otlp(_: &Loadgen, _: &tokio::runtime::Runtime) -> Result<()> {
    anyhow::bail!("built without the `otlp` feature; set METRICS_EXPORT=json-stdout")
}
