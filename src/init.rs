use anyhow::Result;
use once_cell::sync::OnceCell;
#[cfg(feature = "dev")]
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INITED: OnceCell<()> = OnceCell::new();
#[cfg(feature = "dev")]
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Used to name the dev log file.
    pub service_name: String,
}

/// Installs the global tracing subscriber. Repeated calls are no-ops.
///
/// JSON lines to stdout by default; the `dev` feature switches to pretty
/// stdout plus a daily rolling JSON file under `.dev-logs/`.
#[cfg_attr(not(feature = "dev"), allow(unused_variables))]
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    if INITED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    #[cfg(feature = "dev")]
    {
        let file_appender = rolling::daily(".dev-logs", format!("{}.log", cfg.service_name));
        let (nb, guard) = tracing_appender::non_blocking(file_appender);
        let _ = FILE_GUARD.set(guard);

        let layer_stdout = fmt::layer()
            .with_target(true)
            .pretty()
            .with_ansi(atty::is(atty::Stream::Stdout));
        let layer_file = fmt::layer().with_writer(nb).with_ansi(false).json();

        tracing_subscriber::registry()
            .with(filter)
            .with(layer_stdout)
            .with(layer_file)
            .try_init()?;
    }

    #[cfg(not(feature = "dev"))]
    {
        let layer_json = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(layer_json)
            .try_init()?;
    }

    let _ = INITED.set(());
    Ok(())
}

/// Flushes and stops the metric pipeline, if one was started.
pub fn shutdown() {
    #[cfg(feature = "otlp")]
    crate::otlp::shutdown();
}
