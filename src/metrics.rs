use std::sync::Arc;

use opentelemetry::metrics::{Counter, Histogram, Meter, ObservableGauge};

use crate::config::LoadgenConfig;
use crate::events::{REQUEST_COUNT, REQUEST_LATENCY, RequestRecorder};
use crate::instrument::{Instrument, ValueKind};
use crate::labels::LabelSet;
use crate::scheduler::collect_isolated;

/// Handle keeping an observable gauge registration alive.
pub enum RegisteredGauge {
    Double(ObservableGauge<f64>),
    Int(ObservableGauge<i64>),
}

/// Registers `instrument` as an observable gauge. The SDK invokes the
/// callback on every export; failures are logged and never escape it.
pub fn register_gauge(meter: &Meter, instrument: Arc<dyn Instrument>) -> RegisteredGauge {
    let descriptor = instrument.descriptor().clone();

    match descriptor.kind {
        ValueKind::Double => {
            let mut builder = meter
                .f64_observable_gauge(descriptor.name.clone())
                .with_description(descriptor.description);
            if let Some(unit) = descriptor.unit {
                builder = builder.with_unit(unit);
            }
            let gauge = builder
                .with_callback(move |observer| {
                    let result = collect_isolated(instrument.as_ref(), &mut |value, labels| {
                        observer.observe(value.as_f64(), &labels.to_otel_attributes());
                    });
                    if let Err(err) = result {
                        tracing::warn!(instrument = %instrument.descriptor().name, "{err}");
                    }
                })
                .build();
            RegisteredGauge::Double(gauge)
        }
        ValueKind::Int => {
            let mut builder = meter
                .i64_observable_gauge(descriptor.name.clone())
                .with_description(descriptor.description);
            if let Some(unit) = descriptor.unit {
                builder = builder.with_unit(unit);
            }
            let gauge = builder
                .with_callback(move |observer| {
                    let result = collect_isolated(instrument.as_ref(), &mut |value, labels| {
                        observer.observe(value.as_i64(), &labels.to_otel_attributes());
                    });
                    if let Err(err) = result {
                        tracing::warn!(instrument = %instrument.descriptor().name, "{err}");
                    }
                })
                .build();
            RegisteredGauge::Int(gauge)
        }
    }
}

/// Request counter and latency histogram backed by OpenTelemetry instruments.
#[derive(Clone, Debug)]
pub struct OtelRequestRecorder {
    counter: Counter<u64>,
    histogram: Histogram<f64>,
}

impl OtelRequestRecorder {
    /// `boundaries` become the explicit bucket bounds of the latency histogram.
    pub fn new(meter: &Meter, cfg: &LoadgenConfig, boundaries: Vec<f64>) -> Self {
        let counter = meter
            .u64_counter(cfg.metric_name(REQUEST_COUNT))
            .with_description("Synthetic requests handled")
            .build();
        let histogram = meter
            .f64_histogram(cfg.metric_name(REQUEST_LATENCY))
            .with_description("Synthetic request handling time")
            .with_unit("ms")
            .with_boundaries(boundaries)
            .build();
        Self { counter, histogram }
    }
}

impl RequestRecorder for OtelRequestRecorder {
    fn count_request(&self, labels: &LabelSet) {
        self.counter.add(1, &labels.to_otel_attributes());
    }

    fn record_latency(&self, millis: f64, labels: &LabelSet) {
        self.histogram.record(millis, &labels.to_otel_attributes());
    }
}
