//! Taskgen configuration subsystem.
//!
//! Holds the process-wide tunables consumed during episode construction
//! (service-wait timeout, reset-failure budget, goal tolerances, obstacle
//! limits) together with the shared RNG stream that keeps episode
//! generation reproducible under a fixed seed.
//!
//! The store is an explicit, injected object: components receive an
//! `Arc<ConfigStore>` rather than reaching for ambient global state, so
//! tests can construct isolated stores. Live reconfiguration replaces the
//! whole snapshot atomically; a reader never observes a half-applied
//! update.

use std::path::Path;
use std::sync::{Mutex, RwLock};

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pedestrian;
pub mod randomized;

/// Manually mirrored defaults from the task-generator parameter surface.
pub mod defaults {
    pub const TIMEOUT_WAIT_FOR_SERVICE: f64 = 60.0;
    pub const MAX_RESET_FAIL_TIMES: u32 = 10;
    pub const RANDOM_SEED: i64 = -1;
    pub const EPISODES: i64 = -1;
    pub const GOAL_RADIUS: f64 = 1.0;
    /// 30 degrees in radians.
    pub const GOAL_TOLERANCE_ANGLE: f64 = 0.523598776;
    /// -1 means infinite timeout.
    pub const TIMEOUT: f64 = -1.0;
    pub const SPAWN_ROBOT_SAFE_DIST: f64 = 0.25;
    pub const OBSTACLE_MAX_RADIUS: f64 = 15.0;
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("reconfiguration payload is missing field `{0}`")]
    MissingField(&'static str),
    #[error("malformed configuration value: {0}")]
    Malformed(String),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// General episode-generation tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralConfig {
    /// Bound on every service-readiness wait during backend construction,
    /// in seconds.
    pub wait_for_service_timeout: f64,
    /// Consecutive reset failures tolerated before the generator gives up.
    pub max_reset_fail_times: u32,
    /// Number of episodes to generate; `f64::INFINITY` when unbounded.
    pub desired_episodes: f64,
}

/// Robot-related tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfig {
    pub goal_tolerance_radius: f64,
    /// Radians.
    pub goal_tolerance_angle: f64,
    pub spawn_robot_safe_dist: f64,
    /// Per-episode wall-clock budget in seconds; `f64::INFINITY` when
    /// unbounded.
    pub timeout: f64,
}

/// Obstacle-related tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleConfig {
    pub obstacle_max_radius: f64,
}

/// Immutable point-in-time copy of the store's values.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub general: GeneralConfig,
    pub robot: RobotConfig,
    pub obstacles: ObstacleConfig,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig::from(&TaskConfigFile::default())
    }
}

impl From<&TaskConfigFile> for TaskConfig {
    fn from(file: &TaskConfigFile) -> Self {
        Self {
            general: GeneralConfig {
                wait_for_service_timeout: file.timeout_wait_for_service,
                max_reset_fail_times: file.max_reset_fail_times,
                desired_episodes: infinite_when_negative(file.episodes as f64),
            },
            robot: RobotConfig {
                goal_tolerance_radius: file.goal_radius,
                goal_tolerance_angle: file.goal_tolerance_angle,
                spawn_robot_safe_dist: file.spawn_robot_safe_dist,
                timeout: infinite_when_negative(file.timeout),
            },
            obstacles: ObstacleConfig {
                obstacle_max_radius: file.obstacle_max_radius,
            },
        }
    }
}

fn infinite_when_negative(value: f64) -> f64 {
    if value < 0.0 { f64::INFINITY } else { value }
}

/// On-disk configuration schema. Negative `episodes`/`timeout` are the
/// "unbounded" sentinels and are mapped to `f64::INFINITY` when the file is
/// turned into a [`TaskConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfigFile {
    #[serde(default = "default_timeout_wait_for_service")]
    pub timeout_wait_for_service: f64,
    #[serde(default = "default_max_reset_fail_times")]
    pub max_reset_fail_times: u32,
    #[serde(rename = "RANDOM_seed", default = "default_random_seed")]
    pub random_seed: i64,
    #[serde(default = "default_episodes")]
    pub episodes: i64,
    #[serde(default = "default_goal_radius")]
    pub goal_radius: f64,
    #[serde(default = "default_goal_tolerance_angle")]
    pub goal_tolerance_angle: f64,
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_spawn_robot_safe_dist")]
    pub spawn_robot_safe_dist: f64,
    #[serde(default = "default_obstacle_max_radius")]
    pub obstacle_max_radius: f64,
}

fn default_timeout_wait_for_service() -> f64 {
    defaults::TIMEOUT_WAIT_FOR_SERVICE
}
fn default_max_reset_fail_times() -> u32 {
    defaults::MAX_RESET_FAIL_TIMES
}
fn default_random_seed() -> i64 {
    defaults::RANDOM_SEED
}
fn default_episodes() -> i64 {
    defaults::EPISODES
}
fn default_goal_radius() -> f64 {
    defaults::GOAL_RADIUS
}
fn default_goal_tolerance_angle() -> f64 {
    defaults::GOAL_TOLERANCE_ANGLE
}
fn default_timeout() -> f64 {
    defaults::TIMEOUT
}
fn default_spawn_robot_safe_dist() -> f64 {
    defaults::SPAWN_ROBOT_SAFE_DIST
}
fn default_obstacle_max_radius() -> f64 {
    defaults::OBSTACLE_MAX_RADIUS
}

impl TaskConfigFile {
    /// Checks fields without sentinel semantics. Unlike `episodes` and
    /// `timeout`, `timeout_wait_for_service` bounds a real wait and must
    /// be a finite, non-negative number of seconds.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let wait = self.timeout_wait_for_service;
        if !wait.is_finite() || wait < 0.0 {
            return Err(ConfigurationError::Malformed(format!(
                "`timeout_wait_for_service` must be a finite, non-negative number of seconds, got {wait}"
            )));
        }
        Ok(())
    }
}

impl Default for TaskConfigFile {
    fn default() -> Self {
        Self {
            timeout_wait_for_service: defaults::TIMEOUT_WAIT_FOR_SERVICE,
            max_reset_fail_times: defaults::MAX_RESET_FAIL_TIMES,
            random_seed: defaults::RANDOM_SEED,
            episodes: defaults::EPISODES,
            goal_radius: defaults::GOAL_RADIUS,
            goal_tolerance_angle: defaults::GOAL_TOLERANCE_ANGLE,
            timeout: defaults::TIMEOUT,
            spawn_robot_safe_dist: defaults::SPAWN_ROBOT_SAFE_DIST,
            obstacle_max_radius: defaults::OBSTACLE_MAX_RADIUS,
        }
    }
}

pub(crate) const DEFAULT_TASK_CONFIG_CONTENT: &str = r#"{
    "timeout_wait_for_service": 60.0,
    "max_reset_fail_times": 10,
    "RANDOM_seed": -1,
    "episodes": -1,
    "goal_radius": 1.0,
    "goal_tolerance_angle": 0.523598776,
    "timeout": -1.0,
    "spawn_robot_safe_dist": 0.25,
    "obstacle_max_radius": 15.0
}"#;

/// Reads `task_config.json`-style files; writes the default content when
/// the file does not exist yet.
pub struct TaskConfigLoader;

impl TaskConfigLoader {
    pub fn load(path: &Path) -> Result<TaskConfigFile, ConfigurationError> {
        if !path.exists() {
            std::fs::write(path, DEFAULT_TASK_CONFIG_CONTENT)?;
            info!("[TaskConfigLoader] Created new config at: {:?}", path);
        } else {
            info!("[TaskConfigLoader] Found existing config at: {:?}", path);
        }
        let raw = std::fs::read_to_string(path)?;
        let file: TaskConfigFile = serde_json::from_str(&raw)?;
        file.validate()?;
        Ok(file)
    }
}

/// Live-reconfiguration payload. Every field is required: a payload with a
/// missing field is rejected as a whole and the previous snapshot is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReconfigureRequest {
    #[serde(rename = "RANDOM_seed")]
    pub random_seed: i64,
    pub episodes: i64,
    pub goal_radius: f64,
    pub goal_tolerance_angle: f64,
    pub timeout: f64,
}

impl ReconfigureRequest {
    /// Extracts a request from a JSON mapping, naming the first missing or
    /// malformed field. Extraction is all-or-nothing: nothing is applied
    /// until every field has parsed.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigurationError> {
        Ok(Self {
            random_seed: require_i64(value, "RANDOM_seed")?,
            episodes: require_i64(value, "episodes")?,
            goal_radius: require_f64(value, "goal_radius")?,
            goal_tolerance_angle: require_f64(value, "goal_tolerance_angle")?,
            timeout: require_f64(value, "timeout")?,
        })
    }
}

fn require_i64(value: &serde_json::Value, field: &'static str) -> Result<i64, ConfigurationError> {
    let v = value
        .get(field)
        .ok_or(ConfigurationError::MissingField(field))?;
    v.as_i64()
        .ok_or_else(|| ConfigurationError::Malformed(format!("`{field}` is not an integer: {v}")))
}

fn require_f64(value: &serde_json::Value, field: &'static str) -> Result<f64, ConfigurationError> {
    let v = value
        .get(field)
        .ok_or(ConfigurationError::MissingField(field))?;
    v.as_f64()
        .ok_or_else(|| ConfigurationError::Malformed(format!("`{field}` is not a number: {v}")))
}

/// Process-wide mutable configuration state.
///
/// Many concurrent readers, rare exclusive writers: `get()` clones the
/// current snapshot under a read lock, `reconfigure()` swaps the whole
/// snapshot under a single write-lock critical section. The RNG stream is
/// a separate single-writer resource; all stochastic defaults draw from it
/// so a fixed seed reproduces the same episode statistics.
pub struct ConfigStore {
    snapshot: RwLock<TaskConfig>,
    rng: Mutex<ChaCha12Rng>,
}

impl ConfigStore {
    /// Builds a store from an on-disk configuration schema, seeding the RNG
    /// from its `RANDOM_seed` field.
    pub fn new(file: TaskConfigFile) -> Self {
        Self {
            snapshot: RwLock::new(TaskConfig::from(&file)),
            rng: Mutex::new(rng_for_seed(file.random_seed)),
        }
    }

    /// Convenience constructor used by binaries: get-or-create the file,
    /// then build the store from it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        Ok(Self::new(TaskConfigLoader::load(path)?))
    }

    /// Deterministically seeded store for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            snapshot: RwLock::new(TaskConfig::default()),
            rng: Mutex::new(ChaCha12Rng::seed_from_u64(seed)),
        }
    }

    /// Returns the current snapshot. Safe for any number of concurrent
    /// readers; never blocks longer than the bounded write critical
    /// section in [`ConfigStore::reconfigure`].
    pub fn get(&self) -> TaskConfig {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Applies a reconfiguration event atomically.
    ///
    /// Negative `episodes`/`timeout` map to the infinite sentinel; a
    /// negative seed reseeds the RNG from entropy, a non-negative one
    /// deterministically.
    pub fn reconfigure(&self, request: ReconfigureRequest) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        snapshot.general.desired_episodes = infinite_when_negative(request.episodes as f64);
        snapshot.robot.goal_tolerance_radius = request.goal_radius;
        snapshot.robot.goal_tolerance_angle = request.goal_tolerance_angle;
        snapshot.robot.timeout = infinite_when_negative(request.timeout);
        self.reseed(request.random_seed);
        info!(
            "[ConfigStore] Reconfigured: episodes={}, timeout={}, goal_radius={}",
            snapshot.general.desired_episodes, snapshot.robot.timeout, request.goal_radius
        );
    }

    /// Validates and applies a raw reconfiguration mapping. A payload with
    /// a missing or malformed field rejects the whole update and the prior
    /// snapshot is retained.
    pub fn reconfigure_from_value(
        &self,
        value: &serde_json::Value,
    ) -> Result<(), ConfigurationError> {
        let request = ReconfigureRequest::from_value(value)?;
        self.reconfigure(request);
        Ok(())
    }

    /// Reseeds the shared RNG stream.
    pub fn reseed(&self, seed: i64) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *rng = rng_for_seed(seed);
    }

    /// Draws one truncated-normal sample: `Normal((lo+hi)/2, (hi-lo)/6)`
    /// clamped to `[lo, hi]`.
    ///
    /// The formula is intentionally the clamped normal rather than a true
    /// truncated normal; changing it would silently alter episode
    /// statistics.
    pub fn sample_truncated_normal(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        let mean = (high + low) / 2.0;
        let std_dev = (high - low) / 6.0;
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match Normal::new(mean, std_dev) {
            Ok(normal) => normal.sample(&mut *rng).clamp(low, high),
            // non-finite bounds
            Err(_) => mean,
        }
    }

    /// Runs a closure against the shared RNG stream under the single-writer
    /// lock. Callers drawing samples concurrently are serialized here,
    /// which is what keeps a fixed seed reproducible.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut ChaCha12Rng) -> R) -> R {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(TaskConfigFile::default())
    }
}

fn rng_for_seed(seed: i64) -> ChaCha12Rng {
    if seed < 0 {
        ChaCha12Rng::from_entropy()
    } else {
        ChaCha12Rng::seed_from_u64(seed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_map_negative_sentinels_to_infinity() {
        let config = TaskConfig::default();
        assert!(config.general.desired_episodes.is_infinite());
        assert!(config.robot.timeout.is_infinite());
        assert_eq!(config.general.max_reset_fail_times, 10);
        assert_eq!(config.robot.goal_tolerance_radius, 1.0);
    }

    #[test]
    fn reconfigure_applies_sentinels_and_passthrough() {
        let store = ConfigStore::with_seed(7);
        store.reconfigure(ReconfigureRequest {
            random_seed: 42,
            episodes: 5,
            goal_radius: 2.5,
            goal_tolerance_angle: 0.1,
            timeout: -1.0,
        });
        let config = store.get();
        assert_eq!(config.general.desired_episodes, 5.0);
        assert_eq!(config.robot.goal_tolerance_radius, 2.5);
        assert_eq!(config.robot.goal_tolerance_angle, 0.1);
        assert!(config.robot.timeout.is_infinite());

        store.reconfigure(ReconfigureRequest {
            random_seed: 42,
            episodes: -1,
            goal_radius: 2.5,
            goal_tolerance_angle: 0.1,
            timeout: 30.0,
        });
        let config = store.get();
        assert!(config.general.desired_episodes.is_infinite());
        assert_eq!(config.robot.timeout, 30.0);
    }

    #[test]
    fn missing_field_rejects_whole_update() {
        let store = ConfigStore::with_seed(7);
        let before = store.get();

        // `timeout` missing: nothing may be applied.
        let payload = json!({
            "RANDOM_seed": 1,
            "episodes": 99,
            "goal_radius": 9.0,
            "goal_tolerance_angle": 9.0
        });
        let err = store.reconfigure_from_value(&payload).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingField("timeout")));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn malformed_field_rejects_whole_update() {
        let store = ConfigStore::with_seed(7);
        let before = store.get();
        let payload = json!({
            "RANDOM_seed": 1,
            "episodes": "lots",
            "goal_radius": 9.0,
            "goal_tolerance_angle": 9.0,
            "timeout": 1.0
        });
        assert!(store.reconfigure_from_value(&payload).is_err());
        assert_eq!(store.get(), before);
    }

    #[test]
    fn fixed_seed_reproduces_sample_stream() {
        let a = ConfigStore::with_seed(1234);
        let b = ConfigStore::with_seed(1234);
        let sa: Vec<f64> = (0..32).map(|_| a.sample_truncated_normal(0.0, 1.0)).collect();
        let sb: Vec<f64> = (0..32).map(|_| b.sample_truncated_normal(0.0, 1.0)).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn degenerate_range_returns_low_bound() {
        let store = ConfigStore::with_seed(1);
        assert_eq!(store.sample_truncated_normal(3.0, 3.0), 3.0);
        assert_eq!(store.sample_truncated_normal(5.0, 2.0), 5.0);
    }
}
