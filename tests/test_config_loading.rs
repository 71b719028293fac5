use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use testbed_scheduler::error::Error;
use testbed_scheduler::load_config;

fn write_config(dir: &tempfile::TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("igor.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "cluster": { "prefix": "kn", "start": 1, "end": 16, "padLen": 2 },
            "scheduler": {
                "sliceMinutes": 30,
                "minScheduleMinutes": 1440,
                "maxExtensionSlices": 500,
                "speculativeIterations": 5,
                "speculativeStepMinutes": 15
            },
            "network": { "vlanMin": 100, "vlanMax": 200 },
            "resolver": { "timeoutMs": 500, "retries": 1 },
            "storage": { "dataDir": "/var/lib/igor" },
            "logging": { "logDir": "/var/log/igor", "logFile": "sched.log", "level": "debug" }
        }"#,
    );

    let config = load_config(&path).unwrap();

    assert_eq!(config.topology.node_count(), 16);
    assert_eq!(config.topology.node_name(0), "kn01");
    assert_eq!(config.schedule.slice_minutes, 30);
    assert_eq!(config.schedule.min_schedule_minutes, 1440);
    assert_eq!(config.schedule.max_slices, 500);
    assert_eq!(config.schedule.node_count, 16);
    assert_eq!(config.vlan_range, 100..=200);
    assert_eq!(config.resolver.timeout, Duration::from_millis(500));
    assert_eq!(config.resolver.retries, 1);
    assert_eq!(config.speculative_iterations, 5);
    assert_eq!(config.speculative_step_minutes, 15);
    assert_eq!(config.data_dir, PathBuf::from("/var/lib/igor"));
    assert_eq!(config.log.log_file, "sched.log");
    assert_eq!(config.log.level, LevelFilter::Debug);
}

#[test]
fn test_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"{ "cluster": { "prefix": "n", "start": 0, "end": 3 }, "network": { "vlanMin": 1, "vlanMax": 4 } }"#);

    let config = load_config(&path).unwrap();

    assert_eq!(config.topology.node_name(3), "n3");
    assert_eq!(config.schedule.slice_minutes, 60);
    assert_eq!(config.schedule.min_schedule_minutes, 7 * 24 * 60);
    assert_eq!(config.schedule.max_slices, 366 * 24);
    assert_eq!(config.speculative_iterations, 10);
    assert_eq!(config.speculative_step_minutes, 10);
    assert_eq!(config.resolver.timeout, Duration::from_secs(2));
    assert_eq!(config.resolver.retries, 2);
    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert_eq!(config.log.level, LevelFilter::Info);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        r#"{ "cluster": { "prefix": "n", "start": 5, "end": 3 }, "network": { "vlanMin": 1, "vlanMax": 4 } }"#,
        r#"{ "cluster": { "prefix": "n", "start": 1, "end": 3 }, "network": { "vlanMin": 9, "vlanMax": 4 } }"#,
        r#"{ "cluster": { "prefix": "n", "start": 1, "end": 3 }, "network": { "vlanMin": 1, "vlanMax": 4 }, "scheduler": { "sliceMinutes": 0 } }"#,
        r#"{ "cluster": { "prefix": "n", "start": 1, "end": 3 }, "network": { "vlanMin": 1, "vlanMax": 4 }, "scheduler": { "maxExtensionSlices": 10 } }"#,
        r#"{ "cluster": { "prefix": "n", "start": 1, "end": 3 }, "network": { "vlanMin": 1, "vlanMax": 4 }, "logging": { "level": "loud" } }"#,
    ];

    for json in cases {
        let path = write_config(&dir, json);
        assert!(matches!(load_config(&path), Err(Error::ConfigError(_))), "accepted {}", json);
    }
}

#[test]
fn test_malformed_or_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let path = write_config(&dir, r#"{ "cluster": { "prefix": "n" } }"#);
    assert!(matches!(load_config(&path), Err(Error::DeserializationError(_))));

    assert!(matches!(load_config(dir.path().join("missing.json")), Err(Error::IoError(_))));
}
