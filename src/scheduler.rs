use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::Level;

use crate::error::CollectError;
use crate::instrument::{Instrument, InstrumentDescriptor, MetricValue};
use crate::labels::LabelSet;

/// Runs `instrument.collect`, converting a panic into [`CollectError::Panicked`].
pub fn collect_isolated(
    instrument: &dyn Instrument,
    emit: &mut dyn FnMut(MetricValue, LabelSet),
) -> Result<(), CollectError> {
    catch_unwind(AssertUnwindSafe(|| instrument.collect(emit)))
        .unwrap_or_else(|_| Err(CollectError::Panicked(instrument.descriptor().name.clone())))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub observations: usize,
    pub failed_instruments: usize,
}

/// Holds the registered instruments and pulls every one of them per tick.
pub struct ExportScheduler {
    period: Duration,
    instruments: Vec<Arc<dyn Instrument>>,
}

impl ExportScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            instruments: Vec::new(),
        }
    }

    pub fn register(&mut self, instrument: Arc<dyn Instrument>) {
        self.instruments.push(instrument);
    }

    pub fn instruments(&self) -> &[Arc<dyn Instrument>] {
        &self.instruments
    }

    /// Collects every instrument once. A failing instrument is logged and
    /// skipped; the others still run.
    pub fn tick(
        &self,
        sink: &mut dyn FnMut(&InstrumentDescriptor, MetricValue, LabelSet),
    ) -> TickReport {
        let mut report = TickReport::default();

        for instrument in &self.instruments {
            let descriptor = instrument.descriptor();
            let mut emitted = 0;
            let result = collect_isolated(instrument.as_ref(), &mut |value, labels| {
                emitted += 1;
                sink(descriptor, value, labels);
            });
            report.observations += emitted;

            if let Err(err) = result {
                report.failed_instruments += 1;
                match err {
                    CollectError::Panicked(_) => tracing::error!(
                        instrument = %descriptor.name,
                        "{err}"
                    ),
                    CollectError::Probe { .. } => tracing::warn!(
                        instrument = %descriptor.name,
                        "skipping tick: {err}"
                    ),
                }
            }
        }

        report
    }

    /// Ticks every period, writing each observation as a structured log
    /// event, until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.tick(&mut log_observation);
                    tracing::debug!(
                        observations = report.observations,
                        failed = report.failed_instruments,
                        "export tick complete"
                    );
                }
                _ = &mut shutdown => break,
            }
        }
    }
}

pub fn log_observation(descriptor: &InstrumentDescriptor, value: MetricValue, labels: LabelSet) {
    let value = match value {
        MetricValue::Double(v) => json!(v),
        MetricValue::Int(v) => json!(v),
    };
    let payload = json!({
        "metric": descriptor.name,
        "unit": descriptor.unit,
        "value": value,
        "attributes": labels.to_json(),
    });
    tracing::event!(
        target: "loadgen.metric",
        Level::INFO,
        metric_name = %descriptor.name,
        payload = %payload
    );
}
