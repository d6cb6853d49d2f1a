use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::json;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::Level;

use crate::labels::{self, BaseLabels, LabelSet};

pub const REQUEST_COUNT: &str = "request_count";
pub const REQUEST_LATENCY: &str = "request_latency";

/// Request fabricated by the event loop. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyntheticRequest {
    pub path: String,
    pub domain: String,
    pub method: String,
}

impl Default for SyntheticRequest {
    fn default() -> Self {
        Self {
            path: "/api/v1/run".into(),
            domain: "demo.local".into(),
            method: "GET".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SyntheticResponse {
    pub status: u16,
}

/// Destination of the push-style request metrics.
pub trait RequestRecorder: Send + Sync {
    fn count_request(&self, labels: &LabelSet);
    fn record_latency(&self, millis: f64, labels: &LabelSet);
}

pub struct RequestHandler<R> {
    recorder: R,
    base: BaseLabels,
}

impl<R: RequestRecorder> RequestHandler<R> {
    pub fn new(recorder: R, base: BaseLabels) -> Self {
        Self { recorder, base }
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Serves `request` with a no-op body. The recorded latency only covers
    /// the time between the two timestamps around that body.
    pub fn handle(&self, request: &SyntheticRequest) -> SyntheticResponse {
        let started = Instant::now();
        let response = SyntheticResponse { status: 200 };
        let elapsed = started.elapsed();

        let labels = self
            .base
            .to_set()
            .with(labels::PATH, request.path.as_str())
            .with(labels::DOMAIN, request.domain.as_str())
            .with(labels::METHOD, request.method.as_str())
            .with(labels::STATUS, response.status.to_string());

        self.recorder.count_request(&labels);
        self.recorder
            .record_latency(elapsed.as_secs_f64() * 1000.0, &labels);

        response
    }
}

/// Timer driven request simulator. Each firing handles exactly one
/// [`SyntheticRequest`] synchronously before waiting for the next period.
pub struct SyntheticEventLoop<R> {
    period: Duration,
    handler: RequestHandler<R>,
}

impl<R: RequestRecorder> SyntheticEventLoop<R> {
    pub fn new(period: Duration, handler: RequestHandler<R>) -> Self {
        Self { period, handler }
    }

    pub fn handler(&self) -> &RequestHandler<R> {
        &self.handler
    }

    pub fn fire(&self) -> SyntheticResponse {
        let request = SyntheticRequest::default();
        let response = self.handler.handle(&request);
        tracing::debug!(
            request = %serde_json::to_value(&request).unwrap_or_default(),
            status = response.status,
            "synthetic request handled"
        );
        response
    }

    /// Fires once per period, the first time one full period after start,
    /// until `shutdown` resolves. Returns the number of firings.
    pub async fn run<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let start = tokio::time::Instant::now() + self.period;
        let mut interval = interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut fired = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.fire();
                    fired += 1;
                }
            }
        }

        tracing::info!(fired, "synthetic event loop stopped");
        fired
    }
}

/// Writes request metrics as structured log events.
#[derive(Clone, Debug)]
pub struct LogRecorder {
    pub counter_name: String,
    pub histogram_name: String,
}

impl RequestRecorder for LogRecorder {
    fn count_request(&self, labels: &LabelSet) {
        let payload = json!({ "metric": self.counter_name, "value": 1, "attributes": labels.to_json() });
        tracing::event!(
            target: "loadgen.metric",
            Level::INFO,
            metric_name = %self.counter_name,
            payload = %payload
        );
    }

    fn record_latency(&self, millis: f64, labels: &LabelSet) {
        let payload = json!({
            "metric": self.histogram_name,
            "unit": "ms",
            "value": millis,
            "attributes": labels.to_json(),
        });
        tracing::event!(
            target: "loadgen.metric",
            Level::INFO,
            metric_name = %self.histogram_name,
            payload = %payload
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordedRequest, request_recorder};

    #[test]
    fn handle_counts_once_and_records_latency_with_same_labels() {
        let (recorder, store) = request_recorder();
        let handler = RequestHandler::new(recorder, BaseLabels::new("staging"));

        let response = handler.handle(&SyntheticRequest::default());
        assert_eq!(response, SyntheticResponse { status: 200 });

        let recorded = store.lock().expect("recorder lock").clone();
        assert_eq!(recorded.len(), 2);
        let (count_labels, latency_labels) = match (&recorded[0], &recorded[1]) {
            (RecordedRequest::Count(a), RecordedRequest::Latency(ms, b)) => {
                assert!(*ms >= 0.0);
                (a.clone(), b.clone())
            }
            other => panic!("unexpected recording order: {other:?}"),
        };
        assert_eq!(count_labels, latency_labels);
        assert_eq!(
            count_labels.keys().collect::<Vec<_>>(),
            vec![
                labels::PID,
                labels::ENVIRONMENT,
                labels::PATH,
                labels::DOMAIN,
                labels::METHOD,
                labels::STATUS
            ]
        );
        assert_eq!(
            count_labels.get(labels::STATUS),
            Some(&labels::LabelValue::from("200"))
        );
    }
}
