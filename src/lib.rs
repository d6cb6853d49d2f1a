pub mod app;
pub mod buckets;
pub mod config;
pub mod error;
pub mod events;
pub mod init;
pub mod instrument;
pub mod labels;
#[cfg(feature = "otlp")]
pub mod metrics;
#[cfg(feature = "otlp")]
pub mod otlp;
pub mod pool;
pub mod probe;
pub mod scheduler;
pub mod testutil;

pub use app::Loadgen;
pub use buckets::{BucketConfig, geometric_sequence};
pub use config::{ExportMode, LoadgenConfig};
pub use error::{BucketError, CollectError, ConfigError, LoadgenError};
pub use events::{RequestHandler, RequestRecorder, SyntheticEventLoop, SyntheticRequest};
pub use init::{LoggingConfig, init_logging, shutdown};
pub use instrument::{Instrument, InstrumentDescriptor, MetricValue};
pub use labels::{BaseLabels, LabelSet, LabelValue};
pub use pool::{IdentifierPool, build_ids};
pub use probe::{FixedProbe, ProcProbe, SystemProbe};
pub use scheduler::ExportScheduler;
