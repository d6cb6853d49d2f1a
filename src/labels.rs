use serde_json::{Map, Value};

pub const PID: &str = "pid";
pub const ENVIRONMENT: &str = "environment";
pub const WORKFLOW_ID: &str = "workflow_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const UNIT: &str = "unit";
pub const PATH: &str = "path";
pub const DOMAIN: &str = "domain";
pub const METHOD: &str = "method";
pub const STATUS: &str = "status";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LabelValue {
    Str(String),
    Int(i64),
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        LabelValue::Str(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        LabelValue::Str(value)
    }
}

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        LabelValue::Int(value)
    }
}

/// Labels shared by every observation of this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseLabels {
    pub pid: i64,
    pub environment: String,
}

impl BaseLabels {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            pid: i64::from(std::process::id()),
            environment: environment.into(),
        }
    }

    /// Fresh label set seeded with `pid` and `environment`.
    pub fn to_set(&self) -> LabelSet {
        LabelSet::default()
            .with(PID, self.pid)
            .with(ENVIRONMENT, self.environment.as_str())
    }
}

/// Attributes attached to a single observation. Keys keep insertion order and
/// a repeated key replaces the earlier value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    pairs: Vec<(&'static str, LabelValue)>,
}

impl LabelSet {
    pub fn with(mut self, key: &'static str, value: impl Into<LabelValue>) -> Self {
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&LabelValue> {
        self.pairs
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(key, _)| *key)
    }

    pub fn iter_pairs(&self) -> impl Iterator<Item = (&'static str, &LabelValue)> {
        self.pairs.iter().map(|(key, value)| (*key, value))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in self.iter_pairs() {
            let value = match value {
                LabelValue::Str(s) => Value::String(s.clone()),
                LabelValue::Int(i) => Value::from(*i),
            };
            map.insert(key.to_string(), value);
        }
        map
    }

    #[cfg(feature = "otlp")]
    pub fn to_otel_attributes(&self) -> Vec<opentelemetry::KeyValue> {
        self.iter_pairs()
            .map(|(key, value)| match value {
                LabelValue::Str(s) => opentelemetry::KeyValue::new(key, s.clone()),
                LabelValue::Int(i) => opentelemetry::KeyValue::new(key, *i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_labels_seed_pid_and_environment() {
        let set = BaseLabels::new("staging").to_set();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec![PID, ENVIRONMENT]);
        assert_eq!(
            set.get(PID),
            Some(&LabelValue::Int(i64::from(std::process::id())))
        );
        assert_eq!(set.get(ENVIRONMENT), Some(&LabelValue::from("staging")));
    }

    #[test]
    fn repeated_key_replaces_value() {
        let set = LabelSet::default().with(STATUS, "200").with(STATUS, "500");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(STATUS), Some(&LabelValue::from("500")));
    }

    #[test]
    fn json_keeps_value_types() {
        let json = LabelSet::default()
            .with(PID, 42)
            .with(UNIT, "MB")
            .to_json();
        assert_eq!(json.get(PID), Some(&Value::from(42)));
        assert_eq!(json.get(UNIT), Some(&Value::from("MB")));
    }
}
