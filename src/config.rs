use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TunerError};

/// Evaluations a single line search may spend.
pub const LINE_SEARCH_BUDGET: u64 = 10;

/// Coordinate descent stops once its step fraction decays below this value.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// How strictly the evaluation budget is enforced.
///
/// `Soft` only checks the budget between rounds and between coordinates, so a
/// discrete sweep or a line search that has already started may run past it.
/// `Strict` checks before every single evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPolicy {
    #[default]
    Soft,
    Strict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum InitMethod {
    /// Midpoint of every range, first candidate of every discrete parameter.
    #[default]
    Average,
    Random,
}

impl FromStr for InitMethod {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "average" => Ok(InitMethod::Average),
            "random" => Ok(InitMethod::Random),
            other => Err(TunerError::UnknownInitMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for InitMethod {
    type Error = TunerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Options of
/// [`CoordinateDescentTuner`](crate::runners::coordinate_descent_runner::CoordinateDescentTuner).
///
/// `alpha` and `decay_rate` have no defaults; they are checked when tuning
/// starts, before the scorer is called.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateDescentOptions {
    pub alpha: Option<f64>,
    pub decay_rate: Option<f64>,
    pub init_method: Option<InitMethod>,
}

impl CoordinateDescentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = Some(decay_rate);
        self
    }

    pub fn init_method(mut self, init_method: InitMethod) -> Self {
        self.init_method = Some(init_method);
        self
    }

    pub(crate) fn validate(&self) -> Result<CoordinateDescentParams> {
        let alpha = self.alpha.ok_or(TunerError::MissingOption("alpha"))?;
        let decay_rate = self
            .decay_rate
            .ok_or(TunerError::MissingOption("decay_rate"))?;

        if !(alpha > 0. && alpha <= 1.) {
            return Err(TunerError::InvalidOption {
                name: "alpha",
                reason: format!("{alpha} is not in (0, 1]"),
            });
        }
        if !(decay_rate > 0. && decay_rate < 1.) {
            return Err(TunerError::InvalidOption {
                name: "decay_rate",
                reason: format!("{decay_rate} is not in (0, 1)"),
            });
        }

        Ok(CoordinateDescentParams {
            alpha,
            decay_rate,
            init_method: self.init_method.unwrap_or_default(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CoordinateDescentParams {
    pub alpha: f64,
    pub decay_rate: f64,
    pub init_method: InitMethod,
}

/// Number of grid points per continuous range, both ends included.
#[derive(Clone, Debug)]
pub enum GridSteps {
    Uniform(usize),
    PerParameter(BTreeMap<String, usize>),
}

impl GridSteps {
    pub(crate) fn steps_for(&self, name: &str) -> Result<usize> {
        let steps = match self {
            Self::Uniform(steps) => *steps,
            Self::PerParameter(steps) => {
                *steps.get(name).ok_or_else(|| TunerError::InvalidOption {
                    name: "steps",
                    reason: format!("no step count for continuous parameter {name}"),
                })?
            }
        };
        if steps == 0 {
            return Err(TunerError::InvalidOption {
                name: "steps",
                reason: format!("{name} needs at least one grid point"),
            });
        }
        Ok(steps)
    }
}

impl From<usize> for GridSteps {
    fn from(value: usize) -> Self {
        Self::Uniform(value)
    }
}

impl From<BTreeMap<String, usize>> for GridSteps {
    fn from(value: BTreeMap<String, usize>) -> Self {
        Self::PerParameter(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_and_decay_rate_are_required() {
        let err = CoordinateDescentOptions::new()
            .decay_rate(0.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TunerError::MissingOption("alpha")));

        let err = CoordinateDescentOptions::new()
            .alpha(0.1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TunerError::MissingOption("decay_rate")));
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        for decay_rate in [0., 1., 1.5, f64::NAN] {
            let err = CoordinateDescentOptions::new()
                .alpha(0.1)
                .decay_rate(decay_rate)
                .validate()
                .unwrap_err();
            assert!(matches!(
                err,
                TunerError::InvalidOption {
                    name: "decay_rate",
                    ..
                }
            ));
        }
        let err = CoordinateDescentOptions::new()
            .alpha(0.)
            .decay_rate(0.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TunerError::InvalidOption { name: "alpha", .. }));
    }

    #[test]
    fn init_method_defaults_to_average() {
        let params = CoordinateDescentOptions::new()
            .alpha(0.1)
            .decay_rate(0.5)
            .validate()
            .unwrap();
        assert_eq!(params.init_method, InitMethod::Average);
    }

    #[test]
    fn init_method_parses_known_names_only() {
        assert_eq!("random".parse::<InitMethod>().unwrap(), InitMethod::Random);
        assert_eq!("average".parse::<InitMethod>().unwrap(), InitMethod::Average);
        assert!(matches!(
            "midpoint".parse::<InitMethod>(),
            Err(TunerError::UnknownInitMethod(ref name)) if name == "midpoint"
        ));
    }

    #[test]
    fn options_from_json() {
        let options = CoordinateDescentOptions::from_json(
            r#"{"alpha": 0.05, "decay_rate": 0.5, "init_method": "random"}"#,
        )
        .unwrap();
        assert_eq!(options.alpha, Some(0.05));
        assert_eq!(options.init_method, Some(InitMethod::Random));

        let err = CoordinateDescentOptions::from_json(
            r#"{"alpha": 0.05, "decay_rate": 0.5, "init_method": "bogus"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bogus"));

        assert!(CoordinateDescentOptions::from_json(r#"{"alpha": 0.1, "beta": 2}"#).is_err());
    }

    #[test]
    fn grid_steps_lookup() {
        assert_eq!(GridSteps::from(3).steps_for("x").unwrap(), 3);

        let per: GridSteps = BTreeMap::from([("x".to_string(), 5)]).into();
        assert_eq!(per.steps_for("x").unwrap(), 5);
        assert!(per.steps_for("y").is_err());
        assert!(GridSteps::from(0).steps_for("x").is_err());
    }
}
