use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TunerError};

/// A concrete parameter value: a discrete candidate or a point of a continuous range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Domain of a single parameter.
///
/// Serialized the way search spaces are written by hand: a JSON array of
/// candidates, or an object `{"range": [min, max]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    Discrete(Vec<Value>),
    Continuous { range: (f64, f64) },
}

impl Domain {
    pub fn continuous(min: f64, max: f64) -> Self {
        Domain::Continuous { range: (min, max) }
    }

    pub fn discrete<I, V>(candidates: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Domain::Discrete(candidates.into_iter().map(Into::into).collect())
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Domain::Continuous { range } => Some(*range),
            Domain::Discrete(_) => None,
        }
    }

    pub fn candidates(&self) -> Option<&[Value]> {
        match self {
            Domain::Discrete(candidates) => Some(candidates),
            Domain::Continuous { .. } => None,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Domain::Discrete(candidates) => candidates.contains(value),
            Domain::Continuous { range: (min, max) } => value
                .to_f64()
                .map(|v| v.is_finite() && *min <= v && v <= *max)
                .unwrap_or(false),
        }
    }

    /// Midpoint of a range, or the first candidate of a discrete domain.
    pub fn initial_value(&self) -> Option<Value> {
        match self {
            Domain::Continuous { range: (min, max) } => Some(Value::Float((min + max) / 2.)),
            Domain::Discrete(candidates) => candidates.first().cloned(),
        }
    }

    pub(crate) fn random_value(&self, rng: &mut impl Rng) -> Value {
        match self {
            Domain::Continuous { range: (min, max) } => Value::Float(rng.gen_range(*min..=*max)),
            Domain::Discrete(candidates) => {
                candidates[rng.gen_range(0..candidates.len())].clone()
            }
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| TunerError::InvalidSearchSpace {
            name: name.to_string(),
            reason,
        };
        match self {
            Domain::Discrete(candidates) if candidates.is_empty() => {
                Err(invalid("discrete parameter has no candidates".to_string()))
            }
            Domain::Continuous { range: (min, max) } if !min.is_finite() || !max.is_finite() => {
                Err(invalid(format!("range [{min}, {max}] is not finite")))
            }
            Domain::Continuous { range: (min, max) } if min > max => {
                Err(invalid(format!("range min {min} exceeds max {max}")))
            }
            Domain::Continuous { range: (min, max) } if !(max - min).is_finite() => {
                Err(invalid(format!("width of range [{min}, {max}] overflows")))
            }
            _ => Ok(()),
        }
    }
}

/// Named parameter domains, iterated in lexicographic order of their names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Domain>",
    into = "BTreeMap<String, Domain>"
)]
pub struct SearchSpace {
    domains: BTreeMap<String, Domain>,
}

impl SearchSpace {
    pub fn builder() -> SearchSpaceBuilder {
        SearchSpaceBuilder::new()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Domain)> {
        self.domains.iter().map(|(name, domain)| (name.as_str(), domain))
    }

    /// Checks that `config` assigns an in-domain value to every parameter and nothing else.
    pub fn validate_config(&self, config: &Configuration) -> Result<()> {
        if let Some(name) = config.names().find(|name| !self.domains.contains_key(*name)) {
            return Err(TunerError::InvalidConfiguration(format!(
                "unknown parameter {name}"
            )));
        }
        for (name, domain) in &self.domains {
            let value = config.get(name).ok_or_else(|| {
                TunerError::InvalidConfiguration(format!("missing parameter {name}"))
            })?;
            if !domain.contains(value) {
                return Err(TunerError::InvalidConfiguration(format!(
                    "value {value} for {name} is outside its domain"
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, Domain>> for SearchSpace {
    type Error = TunerError;

    fn try_from(domains: BTreeMap<String, Domain>) -> Result<Self> {
        for (name, domain) in &domains {
            domain.validate(name)?;
        }
        Ok(Self { domains })
    }
}

impl From<SearchSpace> for BTreeMap<String, Domain> {
    fn from(space: SearchSpace) -> Self {
        space.domains
    }
}

pub struct SearchSpaceBuilder {
    domains: BTreeMap<String, Domain>,
    duplicate: Option<String>,
}

impl SearchSpaceBuilder {
    pub(crate) fn new() -> Self {
        SearchSpaceBuilder {
            domains: BTreeMap::new(),
            duplicate: None,
        }
    }

    pub fn add_range(self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.add_domain(name, Domain::continuous(min, max))
    }

    pub fn add_choices<I, V>(self, name: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_domain(name, Domain::discrete(candidates))
    }

    pub fn add_domain(mut self, name: impl Into<String>, domain: Domain) -> Self {
        let name = name.into();
        if self.domains.insert(name.clone(), domain).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self
    }

    pub fn build(self) -> Result<SearchSpace> {
        if let Some(name) = self.duplicate {
            return Err(TunerError::InvalidSearchSpace {
                name,
                reason: "parameter declared more than once".to_string(),
            });
        }
        SearchSpace::try_from(self.domains)
    }
}

/// One complete assignment of values to the parameters of a search space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: BTreeMap<String, Value>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::to_f64)
    }

    /// Assigns `value` to `name`, returning the previous value.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        match self.values.get_mut(name) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => self.values.insert(name.to_string(), value),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Configuration {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            Direction::Maximize
        } else {
            Direction::Minimize
        }
    }

    /// Strict improvement of `candidate` over `incumbent`.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    pub fn is_worse(self, candidate: f64, incumbent: f64) -> bool {
        self.is_better(incumbent, candidate)
    }
}

/// The user-supplied scoring function.
pub trait Scorer {
    fn score(&self, config: &Configuration) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&Configuration) -> f64,
{
    fn score(&self, config: &Configuration) -> f64 {
        self(config)
    }
}
