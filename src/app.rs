use std::sync::Arc;

use crate::config::LoadgenConfig;
use crate::error::LoadgenError;
use crate::events::{
    LogRecorder, REQUEST_COUNT, REQUEST_LATENCY, RequestHandler, RequestRecorder,
    SyntheticEventLoop,
};
use crate::instrument::{GaugeContext, Instrument, synthetic_gauges};
use crate::labels::BaseLabels;
use crate::pool::IdentifierPool;
use crate::probe::SystemProbe;
use crate::scheduler::ExportScheduler;

/// Everything built once at startup: the identifier pool, the histogram
/// boundaries and the synthetic gauges.
pub struct Loadgen {
    cfg: LoadgenConfig,
    pool: Arc<IdentifierPool>,
    base: BaseLabels,
    boundaries: Vec<f64>,
    gauges: Vec<Arc<dyn Instrument>>,
}

impl Loadgen {
    pub fn new(cfg: LoadgenConfig, probe: Arc<dyn SystemProbe>) -> Result<Self, LoadgenError> {
        let boundaries = cfg.buckets.boundaries()?;
        let pool = Arc::new(IdentifierPool::build(
            cfg.workflow_id_count,
            cfg.customer_id_count,
        ));
        let base = BaseLabels::new(cfg.environment.clone());

        let gauges = synthetic_gauges(
            &cfg,
            GaugeContext {
                pool: Arc::clone(&pool),
                base: base.clone(),
                probe,
            },
        );

        tracing::info!(
            workflows = cfg.workflow_id_count,
            customers = cfg.customer_id_count,
            cardinality = pool.cardinality(),
            buckets = boundaries.len(),
            "identifier pool ready"
        );

        Ok(Self {
            cfg,
            pool,
            base,
            boundaries,
            gauges,
        })
    }

    pub fn config(&self) -> &LoadgenConfig {
        &self.cfg
    }

    pub fn pool(&self) -> &IdentifierPool {
        &self.pool
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn gauges(&self) -> &[Arc<dyn Instrument>] {
        &self.gauges
    }

    /// Scheduler pulling every gauge on the configured export interval.
    pub fn export_scheduler(&self) -> ExportScheduler {
        let mut scheduler = ExportScheduler::new(self.cfg.export_interval);
        for gauge in &self.gauges {
            scheduler.register(Arc::clone(gauge));
        }
        scheduler
    }

    pub fn event_loop<R: RequestRecorder>(&self, recorder: R) -> SyntheticEventLoop<R> {
        SyntheticEventLoop::new(
            self.cfg.event_interval,
            RequestHandler::new(recorder, self.base.clone()),
        )
    }

    pub fn log_recorder(&self) -> LogRecorder {
        LogRecorder {
            counter_name: self.cfg.metric_name(REQUEST_COUNT),
            histogram_name: self.cfg.metric_name(REQUEST_LATENCY),
        }
    }
}
