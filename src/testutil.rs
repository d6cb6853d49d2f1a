use crate::events::RequestRecorder;
use crate::instrument::{InstrumentDescriptor, MetricValue};
use crate::labels::LabelSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedObservation {
    pub metric: String,
    pub value: MetricValue,
    pub labels: LabelSet,
}

#[derive(Debug, Clone)]
pub enum RecordedRequest {
    Count(LabelSet),
    Latency(f64, LabelSet),
}

/// Sink capturing pulled observations for assertions in tests.
#[derive(Clone, Default)]
pub struct ObservationRecorder {
    observations: Arc<Mutex<Vec<RecordedObservation>>>,
}

impl ObservationRecorder {
    pub fn record(&self, descriptor: &InstrumentDescriptor, value: MetricValue, labels: LabelSet) {
        if let Ok(mut guard) = self.observations.lock() {
            guard.push(RecordedObservation {
                metric: descriptor.name.clone(),
                value,
                labels,
            });
        }
    }

    /// Observations of `metric`, in emission order.
    pub fn for_metric(&self, metric: &str) -> Vec<RecordedObservation> {
        self.observations
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|obs| obs.metric == metric)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// [`RequestRecorder`] capturing counter and histogram calls.
#[derive(Clone)]
pub struct CaptureRecorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RequestRecorder for CaptureRecorder {
    fn count_request(&self, labels: &LabelSet) {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(RecordedRequest::Count(labels.clone()));
        }
    }

    fn record_latency(&self, millis: f64, labels: &LabelSet) {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(RecordedRequest::Latency(millis, labels.clone()));
        }
    }
}

/// Returns a capture recorder and shared storage to inspect requests in tests.
pub fn request_recorder() -> (CaptureRecorder, Arc<Mutex<Vec<RecordedRequest>>>) {
    let storage = Arc::new(Mutex::new(Vec::new()));
    let recorder = CaptureRecorder {
        requests: Arc::clone(&storage),
    };
    (recorder, storage)
}
