//! Typed parameter schemas and resolved parameter sets.
//!
//! A [`ParamSchema`] is pure metadata: an ordered list of [`ParamSpec`]
//! entries that the host renders as dialog controls. Its only behavior is
//! turning host supplied [`RawParameters`] into a validated [`ParameterSet`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FilterError, FilterResult};

/// A raw or resolved parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Declared type and bounds of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    /// Integer slider, clamped to `[min, max]`.
    Int { min: i64, max: i64 },
    /// Float slider, clamped to `[min, max]`; `precision` is a display hint.
    Float { min: f64, max: f64, precision: u8 },
    /// Checkbox.
    Bool,
    /// Drop-down restricted to `choices`.
    Choice { choices: &'static [&'static str] },
}

/// One schema entry: storage key, UI label, unit, type and default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamSpec {
    pub fn float(key: &'static str, bounds: (f64, f64), precision: u8, default: f64) -> Self {
        ParamSpec {
            key,
            label: key,
            unit: "",
            kind: ParamKind::Float {
                min: bounds.0,
                max: bounds.1,
                precision,
            },
            default: ParamValue::Float(default),
        }
    }

    pub fn int(key: &'static str, bounds: (i64, i64), default: i64) -> Self {
        ParamSpec {
            key,
            label: key,
            unit: "",
            kind: ParamKind::Int {
                min: bounds.0,
                max: bounds.1,
            },
            default: ParamValue::Int(default),
        }
    }

    pub fn flag(key: &'static str, default: bool) -> Self {
        ParamSpec {
            key,
            label: key,
            unit: "",
            kind: ParamKind::Bool,
            default: ParamValue::Bool(default),
        }
    }

    pub fn choice(key: &'static str, choices: &'static [&'static str], default: &'static str) -> Self {
        ParamSpec {
            key,
            label: key,
            unit: "",
            kind: ParamKind::Choice { choices },
            default: ParamValue::Text(default.to_string()),
        }
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Coerce a host value: numbers are clamped, enums must match exactly.
    fn coerce(&self, raw: &ParamValue) -> FilterResult<ParamValue> {
        let mismatch = |expected: &str| {
            FilterError::invalid(
                self.key,
                format!("expected {}, got {}", expected, raw.type_name()),
            )
        };

        match (&self.kind, raw) {
            (ParamKind::Float { min, max, .. }, ParamValue::Float(v)) => self.clamp_float(*v, *min, *max),
            (ParamKind::Float { min, max, .. }, ParamValue::Int(i)) => {
                self.clamp_float(*i as f64, *min, *max)
            }
            (ParamKind::Float { .. }, _) => Err(mismatch("a number")),

            (ParamKind::Int { min, max }, ParamValue::Int(i)) => {
                Ok(ParamValue::Int((*i).clamp(*min, *max)))
            }
            (ParamKind::Int { min, max }, ParamValue::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
                Ok(ParamValue::Int((*f as i64).clamp(*min, *max)))
            }
            (ParamKind::Int { .. }, _) => Err(mismatch("an integer")),

            (ParamKind::Bool, ParamValue::Bool(b)) => Ok(ParamValue::Bool(*b)),
            (ParamKind::Bool, _) => Err(mismatch("a boolean")),

            (ParamKind::Choice { choices }, ParamValue::Text(s)) => {
                if choices.contains(&s.as_str()) {
                    Ok(ParamValue::Text(s.clone()))
                } else {
                    Err(FilterError::invalid(
                        self.key,
                        format!("`{}` is not one of {:?}", s, choices),
                    ))
                }
            }
            (ParamKind::Choice { .. }, _) => Err(mismatch("a string")),
        }
    }

    fn clamp_float(&self, v: f64, min: f64, max: f64) -> FilterResult<ParamValue> {
        if !v.is_finite() {
            return Err(FilterError::invalid(self.key, "value is not finite"));
        }
        Ok(ParamValue::Float(v.clamp(min, max)))
    }

    /// Strict check of an already resolved value: no clamping.
    fn admits(&self, value: &ParamValue) -> FilterResult<()> {
        let ok = match (&self.kind, value) {
            (ParamKind::Float { min, max, .. }, ParamValue::Float(v)) => *v >= *min && *v <= *max,
            (ParamKind::Int { min, max }, ParamValue::Int(v)) => *v >= *min && *v <= *max,
            (ParamKind::Bool, ParamValue::Bool(_)) => true,
            (ParamKind::Choice { choices }, ParamValue::Text(s)) => choices.contains(&s.as_str()),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(FilterError::invalid(
                self.key,
                format!("{:?} is outside the declared {:?}", value, self.kind),
            ))
        }
    }
}

/// Ordered parameter declarations of one filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamSchema {
    entries: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new(entries: Vec<ParamSpec>) -> Self {
        ParamSchema { entries }
    }

    pub fn empty() -> Self {
        ParamSchema::default()
    }

    pub fn entries(&self) -> &[ParamSpec] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&ParamSpec> {
        self.entries.iter().find(|spec| spec.key == key)
    }

    /// Every key bound to its default.
    pub fn defaults(&self) -> ParameterSet {
        ParameterSet {
            values: self
                .entries
                .iter()
                .map(|spec| (spec.key.to_string(), spec.default.clone()))
                .collect(),
        }
    }

    /// Validate host input, filling defaults for missing keys.
    pub fn resolve(&self, raw: &RawParameters) -> FilterResult<ParameterSet> {
        for key in raw.0.keys() {
            if self.get(key).is_none() {
                warn!(key = %key, "ignoring parameter not declared by the schema");
            }
        }

        let mut values = BTreeMap::new();
        for spec in &self.entries {
            let value = match raw.get(spec.key) {
                Some(v) => spec.coerce(v)?,
                None => {
                    debug!(key = spec.key, "parameter missing, using default");
                    spec.default.clone()
                }
            };
            values.insert(spec.key.to_string(), value);
        }
        Ok(ParameterSet { values })
    }

    /// Reject a set that does not bind every key within bounds.
    pub fn check(&self, params: &ParameterSet) -> FilterResult<()> {
        for spec in &self.entries {
            match params.get(spec.key) {
                Some(value) => spec.admits(value)?,
                None => return Err(FilterError::invalid(spec.key, "missing")),
            }
        }
        Ok(())
    }
}

/// Host supplied key/value mapping, prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawParameters(BTreeMap<String, ParamValue>);

impl RawParameters {
    pub fn new() -> Self {
        RawParameters::default()
    }

    /// Parse a JSON object such as `{"sigma": 1.5, "uniform": true}`.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        serde_json::from_str(json).map_err(|e| FilterError::invalid("<json>", e.to_string()))
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved values, one per schema key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// An unvalidated set; the runner checks it against the schema before use.
    pub fn new() -> Self {
        ParameterSet::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn float(&self, key: &str) -> FilterResult<f64> {
        match self.get(key) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            Some(other) => Err(FilterError::invalid(
                key,
                format!("expected a number, got {}", other.type_name()),
            )),
            None => Err(FilterError::invalid(key, "missing")),
        }
    }

    pub fn int(&self, key: &str) -> FilterResult<i64> {
        match self.get(key) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(other) => Err(FilterError::invalid(
                key,
                format!("expected an integer, got {}", other.type_name()),
            )),
            None => Err(FilterError::invalid(key, "missing")),
        }
    }

    pub fn flag(&self, key: &str) -> FilterResult<bool> {
        match self.get(key) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(other) => Err(FilterError::invalid(
                key,
                format!("expected a boolean, got {}", other.type_name()),
            )),
            None => Err(FilterError::invalid(key, "missing")),
        }
    }

    pub fn choice(&self, key: &str) -> FilterResult<&str> {
        match self.get(key) {
            Some(ParamValue::Text(v)) => Ok(v.as_str()),
            Some(other) => Err(FilterError::invalid(
                key,
                format!("expected a string, got {}", other.type_name()),
            )),
            None => Err(FilterError::invalid(key, "missing")),
        }
    }
}
