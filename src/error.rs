use thiserror::Error;

/// Invalid or missing environment configuration, detected at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidCount { key: &'static str, value: String },
    #[error("{key} must be a positive number of milliseconds, got '{value}'")]
    InvalidInterval { key: &'static str, value: String },
    #[error("invalid OTLP_ENDPOINT '{value}': {reason}")]
    InvalidEndpoint { value: String, reason: String },
    #[error(
        "unsupported METRICS_EXPORT value: {0}. expected one of otlp-http, otlp-grpc, json-stdout"
    )]
    UnsupportedExport(String),
    #[error("invalid OTLP_HEADERS entry '{entry}': {reason}")]
    InvalidHeader { entry: String, reason: &'static str },
}

/// Precondition violations of the geometric bucket generator.
#[derive(Debug, Error, PartialEq)]
pub enum BucketError {
    #[error("bucket start must be a positive finite number, got {0}")]
    InvalidStart(f64),
    #[error("bucket step must be a finite number greater than 1, got {0}")]
    InvalidStep(f64),
    #[error("bucket boundaries stopped ascending at index {index} ({previous} -> {current})")]
    NotAscending {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Failure while gathering values for one instrument during an export tick.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read {source_name}: {reason}")]
    Probe {
        source_name: &'static str,
        reason: String,
    },
    #[error("instrument '{0}' panicked during collection")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum LoadgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Buckets(#[from] BucketError),
}
