use std::sync::Arc;

use rand::Rng;

use crate::config::LoadgenConfig;
use crate::error::CollectError;
use crate::labels::{self, BaseLabels, LabelSet};
use crate::pool::IdentifierPool;
use crate::probe::SystemProbe;

pub const MEMORY_USAGE: &str = "memory_usage";
pub const CONCURRENCY: &str = "concurrency";
pub const CPU_USAGE: &str = "cpu_usage";
pub const RUN_IN_TIME: &str = "run_in_time";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Int(i64),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Double(v) => v,
            MetricValue::Int(v) => v as f64,
        }
    }

    /// Integer view of the value. `Double` truncates toward zero and
    /// saturates at the `i64` bounds; int-kind gauges only ever emit `Int`.
    pub fn as_i64(self) -> i64 {
        match self {
            MetricValue::Double(v) => v as i64,
            MetricValue::Int(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Double,
    Int,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentDescriptor {
    pub name: String,
    pub description: &'static str,
    pub unit: Option<&'static str>,
    pub kind: ValueKind,
}

/// A gauge-style metric whose values are pulled once per export tick.
pub trait Instrument: Send + Sync {
    fn descriptor(&self) -> &InstrumentDescriptor;

    /// Calls `emit` once per label combination. Either everything for the
    /// tick is emitted or, on error, nothing is.
    fn collect(&self, emit: &mut dyn FnMut(MetricValue, LabelSet)) -> Result<(), CollectError>;
}

/// State every synthetic gauge reads from.
#[derive(Clone)]
pub struct GaugeContext {
    pub pool: Arc<IdentifierPool>,
    pub base: BaseLabels,
    pub probe: Arc<dyn SystemProbe>,
}

impl GaugeContext {
    fn for_each_pair(&self, mut f: impl FnMut(LabelSet)) {
        for (workflow, customer) in self.pool.pairs() {
            f(self
                .base
                .to_set()
                .with(labels::WORKFLOW_ID, workflow)
                .with(labels::CUSTOMER_ID, customer));
        }
    }
}

pub struct MemoryUsageGauge {
    descriptor: InstrumentDescriptor,
    ctx: GaugeContext,
}

impl Instrument for MemoryUsageGauge {
    fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    fn collect(&self, emit: &mut dyn FnMut(MetricValue, LabelSet)) -> Result<(), CollectError> {
        let used = self.ctx.probe.memory_mb()?;
        self.ctx.for_each_pair(|set| {
            emit(MetricValue::Double(used), set.with(labels::UNIT, "MB"));
        });
        Ok(())
    }
}

pub struct ConcurrencyGauge {
    descriptor: InstrumentDescriptor,
    ctx: GaugeContext,
}

impl Instrument for ConcurrencyGauge {
    fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    fn collect(&self, emit: &mut dyn FnMut(MetricValue, LabelSet)) -> Result<(), CollectError> {
        let mut rng = rand::thread_rng();
        // Sampled per pair, not per tick.
        self.ctx.for_each_pair(|set| {
            emit(MetricValue::Int(rng.gen_range(1..=10)), set);
        });
        Ok(())
    }
}

pub struct CpuUsageGauge {
    descriptor: InstrumentDescriptor,
    ctx: GaugeContext,
}

impl Instrument for CpuUsageGauge {
    fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    fn collect(&self, emit: &mut dyn FnMut(MetricValue, LabelSet)) -> Result<(), CollectError> {
        let load = self.ctx.probe.load_average()?;
        self.ctx.for_each_pair(|set| emit(MetricValue::Double(load), set));
        Ok(())
    }
}

pub struct RunInTimeGauge {
    descriptor: InstrumentDescriptor,
    ctx: GaugeContext,
}

impl Instrument for RunInTimeGauge {
    fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    fn collect(&self, emit: &mut dyn FnMut(MetricValue, LabelSet)) -> Result<(), CollectError> {
        let mut rng = rand::thread_rng();
        self.ctx.for_each_pair(|set| {
            emit(MetricValue::Int(rng.gen_range(0..60)), set);
        });
        Ok(())
    }
}

/// Builds the four synthetic gauges, with names carrying the configured prefix.
pub fn synthetic_gauges(cfg: &LoadgenConfig, ctx: GaugeContext) -> Vec<Arc<dyn Instrument>> {
    let descriptor = |base: &str,
                      description: &'static str,
                      unit: Option<&'static str>,
                      kind: ValueKind| InstrumentDescriptor {
        name: cfg.metric_name(base),
        description,
        unit,
        kind,
    };

    vec![
        Arc::new(MemoryUsageGauge {
            descriptor: descriptor(
                MEMORY_USAGE,
                "Tracks the memory usage of the application",
                Some("MB"),
                ValueKind::Double,
            ),
            ctx: ctx.clone(),
        }),
        Arc::new(ConcurrencyGauge {
            descriptor: descriptor(
                CONCURRENCY,
                "Current concurrency level",
                None,
                ValueKind::Int,
            ),
            ctx: ctx.clone(),
        }),
        Arc::new(CpuUsageGauge {
            descriptor: descriptor(
                CPU_USAGE,
                "CPU usage percentage",
                None,
                ValueKind::Double,
            ),
            ctx: ctx.clone(),
        }),
        Arc::new(RunInTimeGauge {
            descriptor: descriptor(
                RUN_IN_TIME,
                "Run time in seconds",
                Some("s"),
                ValueKind::Int,
            ),
            ctx,
        }),
    ]
}
