//! Hyperparameter samples and the search space they are drawn from.
//!
//! Blocks ask a [`HyperParameters`] sample for named choices while they
//! build. The first time a name is seen its candidate values are registered
//! in the sample's space; the sampled value is returned if one was set,
//! otherwise the first candidate (the default) is used and recorded.
//!
//! # Example
//!
//! ```
//! use automodel::hyperparameters::HyperParameters;
//!
//! let mut hp = HyperParameters::new().with_str("optimizer", "sgd");
//! assert_eq!(hp.choice_str("optimizer", &["adam", "sgd"]), "sgd");
//! assert_eq!(hp.choice_int("units", &[16, 32]), 16);
//! assert_eq!(hp.space().len(), 2);
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// A named choice among a fixed list of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParameter {
    pub name: String,
    pub values: Vec<ParamValue>,
}

impl HyperParameter {
    /// Returns the default (first) candidate.
    pub fn default_value(&self) -> &ParamValue {
        &self.values[0]
    }
}

/// One assignment of tunable choices, plus the space discovered so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperParameters {
    space: Vec<HyperParameter>,
    values: BTreeMap<String, ParamValue>,
}

impl HyperParameters {
    /// Creates an empty sample. Every choice resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws one value for every hyperparameter in `space`.
    pub fn sample<R: Rng + ?Sized>(space: &[HyperParameter], rng: &mut R) -> Self {
        let mut values = BTreeMap::new();
        for param in space {
            if let Some(value) = param.values.choose(rng) {
                values.insert(param.name.clone(), value.clone());
            }
        }
        Self {
            space: space.to_vec(),
            values,
        }
    }

    /// Fixes `name` to an integer value.
    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.values.insert(name.to_string(), ParamValue::Int(value));
        self
    }

    /// Fixes `name` to a string value.
    pub fn with_str(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), ParamValue::from(value));
        self
    }

    /// Returns the value for `name` if `values` contains it, else the first
    /// candidate. Registers the choice in the space on first use.
    pub fn choice(&mut self, name: &str, values: Vec<ParamValue>) -> ParamValue {
        assert!(!values.is_empty(), "Choice {name} requires at least 1 value");

        if !self.space.iter().any(|p| p.name == name) {
            self.space.push(HyperParameter {
                name: name.to_string(),
                values: values.clone(),
            });
        }

        let value = match self.values.get(name) {
            Some(current) if values.contains(current) => current.clone(),
            _ => values[0].clone(),
        };
        self.values.insert(name.to_string(), value.clone());
        value
    }

    /// Integer choice; see [`HyperParameters::choice`].
    pub fn choice_int(&mut self, name: &str, values: &[i64]) -> i64 {
        let candidates = values.iter().copied().map(ParamValue::Int).collect();
        match self.choice(name, candidates) {
            ParamValue::Int(value) => value,
            _ => values[0],
        }
    }

    /// String choice; see [`HyperParameters::choice`].
    pub fn choice_str(&mut self, name: &str, values: &[&str]) -> String {
        let candidates = values.iter().map(|&v| ParamValue::from(v)).collect();
        match self.choice(name, candidates) {
            ParamValue::Str(value) => value,
            _ => values[0].to_string(),
        }
    }

    /// Returns the recorded value for `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ParamValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the hyperparameters registered so far, in registration order.
    pub fn space(&self) -> &[HyperParameter] {
        &self.space
    }

    /// Returns all recorded values.
    pub fn values(&self) -> &BTreeMap<String, ParamValue> {
        &self.values
    }

    /// Merges hyperparameters from `other` that are not yet registered.
    pub fn extend_space(&mut self, other: &[HyperParameter]) {
        for param in other {
            if !self.space.iter().any(|p| p.name == param.name) {
                self.space.push(param.clone());
            }
        }
    }

    /// Serializes the recorded values to pretty JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_default_choice_is_first_value() {
        let mut hp = HyperParameters::new();
        assert_eq!(hp.choice_str("optimizer", &["adam", "sgd"]), "adam");
        assert_eq!(hp.get_str("optimizer"), Some("adam"));
    }

    #[test]
    fn test_fixed_value_is_returned() {
        let mut hp = HyperParameters::new().with_int("units", 64);
        assert_eq!(hp.choice_int("units", &[16, 32, 64]), 64);
    }

    #[test]
    fn test_value_outside_candidates_falls_back_to_default() {
        let mut hp = HyperParameters::new().with_int("units", 7);
        assert_eq!(hp.choice_int("units", &[16, 32]), 16);
        assert_eq!(hp.get_int("units"), Some(16));
    }

    #[test]
    fn test_space_registered_once_in_order() {
        let mut hp = HyperParameters::new();
        hp.choice_int("a", &[1, 2]);
        hp.choice_str("b", &["x"]);
        hp.choice_int("a", &[1, 2]);

        let names: Vec<&str> = hp.space().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_sample_draws_from_candidates() {
        let mut hp = HyperParameters::new();
        hp.choice_int("units", &[16, 32, 64]);
        hp.choice_str("activation", &["relu", "tanh"]);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut sample = HyperParameters::sample(hp.space(), &mut rng);
            let units = sample.choice_int("units", &[16, 32, 64]);
            assert!([16, 32, 64].contains(&units));
            let activation = sample.get_str("activation").unwrap().to_string();
            assert!(activation == "relu" || activation == "tanh");
        }
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let mut hp = HyperParameters::new();
        hp.choice_int("units", &[16, 32, 64, 128]);

        let a = HyperParameters::sample(hp.space(), &mut StdRng::seed_from_u64(3));
        let b = HyperParameters::sample(hp.space(), &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_json() {
        let mut hp = HyperParameters::new();
        hp.choice_int("units", &[32]);
        let json = hp.to_json().unwrap();
        assert!(json.contains("\"units\": 32"));
    }

    #[test]
    #[should_panic(expected = "requires at least 1 value")]
    fn test_empty_choice_panics() {
        HyperParameters::new().choice("empty", vec![]);
    }
}
