use std::collections::HashMap;
use std::env;
use std::time::Duration;

use url::Url;

use crate::buckets::BucketConfig;
use crate::error::ConfigError;

pub const DEFAULT_WORKFLOW_ID_COUNT: usize = 100;
pub const DEFAULT_CUSTOMER_ID_COUNT: usize = 40;
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8429/opentelemetry/api/v1/push";
pub const DEFAULT_SERVICE_NAME: &str = "basic-metric-service";
pub const DEFAULT_METER_NAME: &str = "example-exporter-collector";
pub const DEFAULT_ENVIRONMENT: &str = "staging";
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_millis(15_000);
pub const DEFAULT_EVENT_INTERVAL: Duration = Duration::from_millis(15_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportMode {
    OtlpHttp,
    OtlpGrpc,
    JsonStdout,
}

/// Immutable process configuration, read once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadgenConfig {
    pub workflow_id_count: usize,
    pub customer_id_count: usize,
    pub endpoint: String,
    pub service_name: String,
    pub export_interval: Duration,
    pub event_interval: Duration,
    pub meter_name: String,
    pub environment: String,
    pub metric_prefix: String,
    pub export_mode: ExportMode,
    pub headers: HashMap<String, String>,
    pub buckets: BucketConfig,
}

impl Default for LoadgenConfig {
    fn default() -> Self {
        Self {
            workflow_id_count: DEFAULT_WORKFLOW_ID_COUNT,
            customer_id_count: DEFAULT_CUSTOMER_ID_COUNT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            export_interval: DEFAULT_EXPORT_INTERVAL,
            event_interval: DEFAULT_EVENT_INTERVAL,
            meter_name: DEFAULT_METER_NAME.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            metric_prefix: String::new(),
            export_mode: ExportMode::OtlpHttp,
            headers: HashMap::new(),
            buckets: BucketConfig::default(),
        }
    }
}

impl LoadgenConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset or empty
    /// values fall back to defaults; anything set but malformed is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let workflow_id_count = match get("WORKFLOW_ID_COUNT") {
            Some(value) => parse_count("WORKFLOW_ID_COUNT", &value)?,
            None => defaults.workflow_id_count,
        };
        let customer_id_count = match get("CUSTOMER_ID_COUNT") {
            Some(value) => parse_count("CUSTOMER_ID_COUNT", &value)?,
            None => defaults.customer_id_count,
        };

        let endpoint = get("OTLP_ENDPOINT").unwrap_or(defaults.endpoint);
        validate_endpoint(&endpoint)?;

        let export_interval = match get("OTLP_METRIC_EXPORTER_FREQUENCY") {
            Some(value) => parse_interval("OTLP_METRIC_EXPORTER_FREQUENCY", &value)?,
            None => defaults.export_interval,
        };
        let event_interval = match get("SYNTHETIC_EVENT_FREQUENCY") {
            Some(value) => parse_interval("SYNTHETIC_EVENT_FREQUENCY", &value)?,
            None => defaults.event_interval,
        };

        let export_mode = parse_export_mode(get("METRICS_EXPORT").as_deref())?;
        let headers = parse_headers(get("OTLP_HEADERS").as_deref())?;

        Ok(Self {
            workflow_id_count,
            customer_id_count,
            endpoint,
            service_name: get("SERVICE_NAME").unwrap_or(defaults.service_name),
            export_interval,
            event_interval,
            meter_name: get("OTLP_METER_NAME").unwrap_or(defaults.meter_name),
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            // Prefix is taken verbatim, including separators.
            metric_prefix: lookup("METRIC_PREFIX").unwrap_or_default(),
            export_mode,
            headers,
            buckets: defaults.buckets,
        })
    }

    pub fn metric_name(&self, base: &str) -> String {
        format!("{}{}", self.metric_prefix, base)
    }
}

fn parse_count(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ConfigError::InvalidCount {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_interval(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidInterval {
            key,
            value: value.to_string(),
        }),
    }
}

fn validate_endpoint(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::InvalidEndpoint {
        value: value.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            value: value.to_string(),
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

fn parse_export_mode(value: Option<&str>) -> Result<ExportMode, ConfigError> {
    let Some(value) = value else {
        return Ok(ExportMode::OtlpHttp);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "otlp-http" => Ok(ExportMode::OtlpHttp),
        "otlp-grpc" => Ok(ExportMode::OtlpGrpc),
        "json-stdout" => Ok(ExportMode::JsonStdout),
        other => Err(ConfigError::UnsupportedExport(other.to_string())),
    }
}

fn parse_headers(value: Option<&str>) -> Result<HashMap<String, String>, ConfigError> {
    let mut headers = HashMap::new();

    let Some(value) = value else {
        return Ok(headers);
    };

    for pair in value.split(',') {
        let trimmed = pair.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (key, val) = trimmed
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidHeader {
                entry: trimmed.to_string(),
                reason: "expected key=value",
            })?;

        if key.trim().is_empty() {
            return Err(ConfigError::InvalidHeader {
                entry: trimmed.to_string(),
                reason: "key cannot be empty",
            });
        }

        headers.insert(key.trim().to_string(), val.trim().to_string());
    }

    Ok(headers)
}
