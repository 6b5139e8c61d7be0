//! Integration tests for the configuration subsystem.
//!
//! Covers the file loader's get-or-create semantics, the live
//! reconfiguration entry point, and snapshot atomicity under a concurrent
//! reader.

use std::sync::Arc;

use tempfile::TempDir;

use taskgen_framework::configuration::{
    ConfigStore, ConfigurationError, ReconfigureRequest, TaskConfigLoader,
};

#[test]
fn loader_creates_default_config_when_missing() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("task_config.json");

    let file = TaskConfigLoader::load(&path).expect("load should create defaults");
    assert!(path.exists(), "default config file should have been written");
    assert_eq!(file.timeout_wait_for_service, 60.0);
    assert_eq!(file.max_reset_fail_times, 10);
    assert_eq!(file.episodes, -1);
    assert_eq!(file.random_seed, -1);
}

#[test]
fn loader_reads_existing_config_and_fills_missing_keys() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("task_config.json");
    std::fs::write(
        &path,
        r#"{ "episodes": 20, "goal_radius": 0.75, "RANDOM_seed": 99 }"#,
    )
    .expect("write config");

    let file = TaskConfigLoader::load(&path).expect("load");
    assert_eq!(file.episodes, 20);
    assert_eq!(file.goal_radius, 0.75);
    assert_eq!(file.random_seed, 99);
    // untouched keys fall back to the stock defaults
    assert_eq!(file.obstacle_max_radius, 15.0);
}

#[test]
fn loader_rejects_malformed_json() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("task_config.json");
    std::fs::write(&path, "{ not json").expect("write config");

    let err = TaskConfigLoader::load(&path).unwrap_err();
    assert!(matches!(err, ConfigurationError::Parse(_)));
}

/// `timeout_wait_for_service` bounds a real wait and has no negative
/// sentinel; a bad value must be a load-time diagnostic.
#[test]
fn loader_rejects_negative_service_wait_timeout() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("task_config.json");
    std::fs::write(&path, r#"{ "timeout_wait_for_service": -5.0 }"#).expect("write config");

    let err = TaskConfigLoader::load(&path).unwrap_err();
    assert!(matches!(err, ConfigurationError::Malformed(_)));
}

#[test]
fn store_from_file_maps_sentinels() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("task_config.json");
    std::fs::write(&path, r#"{ "episodes": -1, "timeout": 42.0 }"#).expect("write config");

    let store = ConfigStore::from_file(&path).expect("store");
    let config = store.get();
    assert!(config.general.desired_episodes.is_infinite());
    assert_eq!(config.robot.timeout, 42.0);
}

/// A reader racing a reconfiguration must never observe a snapshot mixing
/// fields from two different updates.
#[test]
fn reconfigure_is_atomic_under_concurrent_reads() {
    let store = Arc::new(ConfigStore::with_seed(1));

    // two coherent states, distinguishable by episodes == goal_radius pairing
    let state_a = ReconfigureRequest {
        random_seed: 1,
        episodes: 5,
        goal_radius: 5.0,
        goal_tolerance_angle: 0.5,
        timeout: 5.0,
    };
    let state_b = ReconfigureRequest {
        random_seed: 1,
        episodes: 7,
        goal_radius: 7.0,
        goal_tolerance_angle: 0.5,
        timeout: 7.0,
    };
    store.reconfigure(state_a);

    let writer_store = Arc::clone(&store);
    let writer = std::thread::spawn(move || {
        for i in 0..2000 {
            let next = if i % 2 == 0 { state_b } else { state_a };
            writer_store.reconfigure(next);
        }
    });

    let reader_store = Arc::clone(&store);
    let reader = std::thread::spawn(move || {
        for _ in 0..2000 {
            let config = reader_store.get();
            let episodes = config.general.desired_episodes;
            assert_eq!(
                episodes, config.robot.goal_tolerance_radius,
                "torn snapshot: episodes and goal_radius disagree"
            );
            assert_eq!(
                episodes, config.robot.timeout,
                "torn snapshot: episodes and timeout disagree"
            );
        }
    });

    writer.join().expect("writer thread");
    reader.join().expect("reader thread");
}

#[test]
fn reseed_restarts_the_sample_stream() {
    let store = ConfigStore::with_seed(11);
    let first: Vec<f64> = (0..8).map(|_| store.sample_truncated_normal(0.0, 1.0)).collect();
    store.reseed(11);
    let second: Vec<f64> = (0..8).map(|_| store.sample_truncated_normal(0.0, 1.0)).collect();
    assert_eq!(first, second);

    // negative seed draws from entropy: stream must still be in-bounds
    store.reseed(-1);
    for _ in 0..32 {
        let v = store.sample_truncated_normal(0.0, 1.0);
        assert!((0.0..=1.0).contains(&v));
    }
}
