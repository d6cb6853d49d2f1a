use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use metric_loadgen::testutil::ObservationRecorder;
use metric_loadgen::{FixedProbe, LabelValue, Loadgen, LoadgenConfig, MetricValue};

fn loadgen(pairs: &[(&str, &str)]) -> Loadgen {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let cfg = LoadgenConfig::from_lookup(|key| env.get(key).cloned()).expect("valid config");
    Loadgen::new(
        cfg,
        Arc::new(FixedProbe {
            memory_mb: 48.25,
            load_average: 1.5,
        }),
    )
    .expect("loadgen builds")
}

#[test]
fn one_tick_yields_full_cross_product_per_gauge() {
    let loadgen = loadgen(&[
        ("WORKFLOW_ID_COUNT", "3"),
        ("CUSTOMER_ID_COUNT", "2"),
        ("ENVIRONMENT", "staging"),
    ]);
    let scheduler = loadgen.export_scheduler();
    let recorder = ObservationRecorder::default();

    let report = scheduler.tick(&mut |descriptor, value, labels| {
        recorder.record(descriptor, value, labels)
    });
    assert_eq!(report.observations, 24);
    assert_eq!(report.failed_instruments, 0);

    let base_keys: BTreeSet<&str> = ["pid", "environment", "workflow_id", "customer_id"]
        .into_iter()
        .collect();

    for metric in ["memory_usage", "concurrency", "cpu_usage", "run_in_time"] {
        let observations = recorder.for_metric(metric);
        assert_eq!(observations.len(), 6, "{metric}");

        let pairs: HashSet<_> = observations
            .iter()
            .map(|obs| {
                (
                    obs.labels.get("workflow_id").cloned(),
                    obs.labels.get("customer_id").cloned(),
                )
            })
            .collect();
        assert_eq!(pairs.len(), 6, "{metric} repeated a pair");

        for obs in &observations {
            let keys: BTreeSet<&str> = obs.labels.keys().collect();
            let mut expected = base_keys.clone();
            if metric == "memory_usage" {
                expected.insert("unit");
            }
            assert_eq!(keys, expected, "{metric}");
            assert_eq!(
                obs.labels.get("environment"),
                Some(&LabelValue::from("staging"))
            );
        }
    }
}

#[test]
fn shared_scalars_are_constant_within_a_tick() {
    let loadgen = loadgen(&[("WORKFLOW_ID_COUNT", "4"), ("CUSTOMER_ID_COUNT", "5")]);
    let recorder = ObservationRecorder::default();
    loadgen
        .export_scheduler()
        .tick(&mut |d, v, l| recorder.record(d, v, l));

    let memory: HashSet<u64> = recorder
        .for_metric("memory_usage")
        .iter()
        .map(|obs| obs.value.as_f64().to_bits())
        .collect();
    assert_eq!(memory.len(), 1);

    let cpu: Vec<MetricValue> = recorder
        .for_metric("cpu_usage")
        .iter()
        .map(|obs| obs.value)
        .collect();
    assert_eq!(cpu.len(), 20);
    assert!(cpu.iter().all(|v| *v == MetricValue::Double(1.5)));
}

#[test]
fn random_gauges_vary_across_ticks() {
    let loadgen = loadgen(&[("WORKFLOW_ID_COUNT", "2"), ("CUSTOMER_ID_COUNT", "2")]);
    let scheduler = loadgen.export_scheduler();
    let recorder = ObservationRecorder::default();

    for _ in 0..25 {
        scheduler.tick(&mut |d, v, l| recorder.record(d, v, l));
    }

    let concurrency: HashSet<i64> = recorder
        .for_metric("concurrency")
        .iter()
        .map(|obs| obs.value.as_i64())
        .collect();
    assert!(concurrency.iter().all(|v| (1..=10).contains(v)));
    assert!(concurrency.len() > 1);

    let run_in_time: HashSet<i64> = recorder
        .for_metric("run_in_time")
        .iter()
        .map(|obs| obs.value.as_i64())
        .collect();
    assert!(run_in_time.iter().all(|v| (0..60).contains(v)));
    assert!(run_in_time.len() > 1);
}

#[test]
fn prefix_applies_to_every_metric() {
    let loadgen = loadgen(&[
        ("WORKFLOW_ID_COUNT", "1"),
        ("CUSTOMER_ID_COUNT", "1"),
        ("METRIC_PREFIX", "synthetic_"),
    ]);
    let names: Vec<String> = loadgen
        .gauges()
        .iter()
        .map(|g| g.descriptor().name.clone())
        .collect();
    assert!(names.iter().all(|name| name.starts_with("synthetic_")));
    assert_eq!(loadgen.log_recorder().counter_name, "synthetic_request_count");
    assert_eq!(loadgen.boundaries().len(), 31);
}
