//! Lazily sampled parameter defaults.
//!
//! A [`RandomizedParameter`] wraps the default for one tunable: either a
//! fixed scalar, or a `[low, high]` range that is resolved to a fresh
//! truncated-normal sample on every evaluation. Explicit values always win
//! over the configured default.
//!
//! Defaults are read once at subsystem startup from a [`ParameterSource`]
//! (a flat key-value namespace) and are immutable for the process
//! lifetime; only the sample, never the configured range, is recomputed
//! per call.

use std::collections::HashMap;

use log::warn;

use crate::configuration::ConfigStore;

/// A raw value as seen at the parameter-source boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Float(f64),
    Integer(i64),
    Text(String),
    /// Two-element list in the source; becomes a sampled range.
    Range { low: f64, high: f64 },
}

/// Flat key-value parameter namespace, queried once at startup.
pub trait ParameterSource: Send + Sync {
    fn get(&self, key: &str) -> Option<ParameterValue>;
}

/// In-memory parameter source backing tests and programmatic wiring.
#[derive(Debug, Default, Clone)]
pub struct MapParameterSource {
    values: HashMap<String, ParameterValue>,
}

impl MapParameterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.values.insert(key.into(), value);
    }
}

impl FromIterator<(String, ParameterValue)> for MapParameterSource {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl ParameterSource for MapParameterSource {
    fn get(&self, key: &str) -> Option<ParameterValue> {
        self.values.get(key).cloned()
    }
}

/// Value types a sampled range can resolve to.
pub trait TruncatedSample: Sized + Clone {
    fn sample_between(low: f64, high: f64, store: &ConfigStore) -> Self;
}

impl TruncatedSample for f64 {
    fn sample_between(low: f64, high: f64, store: &ConfigStore) -> Self {
        store.sample_truncated_normal(low, high)
    }
}

impl TruncatedSample for i64 {
    fn sample_between(low: f64, high: f64, store: &ConfigStore) -> Self {
        store.sample_truncated_normal(low, high).round() as i64
    }
}

#[derive(Debug, Clone)]
enum ParameterDefault<T> {
    Scalar(T),
    Range { low: f64, high: f64 },
}

/// Lazy, non-deterministic default for one tunable.
#[derive(Debug, Clone)]
pub struct RandomizedParameter<T> {
    default: ParameterDefault<T>,
}

impl<T: Clone> RandomizedParameter<T> {
    /// A plain scalar default.
    pub fn fixed(value: T) -> Self {
        Self {
            default: ParameterDefault::Scalar(value),
        }
    }

    /// True when evaluation draws a fresh sample instead of returning a
    /// stored scalar.
    pub fn is_randomized(&self) -> bool {
        matches!(self.default, ParameterDefault::Range { .. })
    }
}

impl<T: TruncatedSample> RandomizedParameter<T> {
    /// A `[low, high]` range resolved to a fresh truncated-normal sample
    /// per evaluation.
    pub fn range(low: f64, high: f64) -> Self {
        Self {
            default: ParameterDefault::Range { low, high },
        }
    }

    /// Resolves the parameter. An explicit value always overrides the
    /// configured default; a range draws one sample from the store's
    /// shared RNG stream. Samples are never cached.
    pub fn resolve(&self, explicit: Option<T>, store: &ConfigStore) -> T {
        if let Some(value) = explicit {
            return value;
        }
        match &self.default {
            ParameterDefault::Scalar(value) => value.clone(),
            ParameterDefault::Range { low, high } => T::sample_between(*low, *high, store),
        }
    }
}

impl RandomizedParameter<String> {
    /// Text parameters support only scalar defaults; ranges never occur.
    pub fn resolve_text(&self, explicit: Option<String>) -> String {
        if let Some(value) = explicit {
            return value;
        }
        match &self.default {
            ParameterDefault::Scalar(value) => value.clone(),
            ParameterDefault::Range { low, .. } => low.to_string(),
        }
    }
}

impl RandomizedParameter<f64> {
    /// Reads one float default from the source, falling back when the key
    /// is absent. A two-element list becomes a sampled range.
    pub fn float_from_source(source: &dyn ParameterSource, key: &str, fallback: f64) -> Self {
        match source.get(key) {
            Some(ParameterValue::Float(v)) => Self::fixed(v),
            Some(ParameterValue::Integer(v)) => Self::fixed(v as f64),
            Some(ParameterValue::Range { low, high }) => Self::range(low, high),
            Some(other) => {
                warn!("[RandomizedParameter] `{key}` has non-numeric value {other:?}, using fallback {fallback}");
                Self::fixed(fallback)
            }
            None => Self::fixed(fallback),
        }
    }
}

impl RandomizedParameter<i64> {
    pub fn int_from_source(source: &dyn ParameterSource, key: &str, fallback: i64) -> Self {
        match source.get(key) {
            Some(ParameterValue::Integer(v)) => Self::fixed(v),
            Some(ParameterValue::Float(v)) => Self::fixed(v.round() as i64),
            Some(ParameterValue::Range { low, high }) => Self::range(low, high),
            Some(other) => {
                warn!("[RandomizedParameter] `{key}` has non-integer value {other:?}, using fallback {fallback}");
                Self::fixed(fallback)
            }
            None => Self::fixed(fallback),
        }
    }
}

impl RandomizedParameter<String> {
    pub fn text_from_source(source: &dyn ParameterSource, key: &str, fallback: &str) -> Self {
        match source.get(key) {
            Some(ParameterValue::Text(v)) => Self::fixed(v),
            Some(other) => {
                warn!("[RandomizedParameter] `{key}` has non-text value {other:?}, using fallback {fallback:?}");
                Self::fixed(fallback.to_string())
            }
            None => Self::fixed(fallback.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_value_always_wins() {
        let store = ConfigStore::with_seed(1);
        let param = RandomizedParameter::<f64>::range(0.0, 1.0);
        assert_eq!(param.resolve(Some(42.0), &store), 42.0);

        let fixed = RandomizedParameter::fixed(0.3);
        assert_eq!(fixed.resolve(Some(-7.0), &store), -7.0);
    }

    #[test]
    fn scalar_default_is_returned_unchanged() {
        let store = ConfigStore::with_seed(1);
        let param = RandomizedParameter::fixed(0.3);
        assert_eq!(param.resolve(None, &store), 0.3);
        assert!(!param.is_randomized());
    }

    #[test]
    fn range_samples_stay_within_bounds() {
        let store = ConfigStore::with_seed(99);
        let param = RandomizedParameter::<f64>::range(0.2, 0.6);
        assert!(param.is_randomized());
        for _ in 0..1000 {
            let v = param.resolve(None, &store);
            assert!((0.2..=0.6).contains(&v), "sample {v} out of bounds");
        }
    }

    #[test]
    fn range_samples_are_not_cached() {
        let store = ConfigStore::with_seed(5);
        let param = RandomizedParameter::<f64>::range(0.0, 100.0);
        let first = param.resolve(None, &store);
        let distinct = (0..16).any(|_| param.resolve(None, &store) != first);
        assert!(distinct, "resolution appears cached");
    }

    #[test]
    fn source_list_becomes_range_and_scalar_stays_scalar() {
        let mut source = MapParameterSource::new();
        source.insert("VMAX", ParameterValue::Range { low: 0.1, high: 0.5 });
        source.insert("WAIT_TIME", ParameterValue::Float(2.0));

        let vmax = RandomizedParameter::float_from_source(&source, "VMAX", 0.3);
        assert!(vmax.is_randomized());
        let wait = RandomizedParameter::float_from_source(&source, "WAIT_TIME", 0.0);
        assert!(!wait.is_randomized());
        let missing = RandomizedParameter::float_from_source(&source, "NOPE", 1.5);
        let store = ConfigStore::with_seed(1);
        assert_eq!(missing.resolve(None, &store), 1.5);
    }

    #[test]
    fn empirical_mean_converges_to_midpoint() {
        let store = ConfigStore::with_seed(2024);
        let param = RandomizedParameter::<f64>::range(2.0, 8.0);
        let n = 10_000;
        let sum: f64 = (0..n).map(|_| param.resolve(None, &store)).sum();
        let mean = sum / n as f64;
        assert!(
            (mean - 5.0).abs() < 0.1,
            "empirical mean {mean} too far from midpoint 5.0"
        );
    }
}
