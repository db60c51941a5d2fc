use crate::{
    config::GridSteps,
    errors::Result,
    library::{Configuration, Domain, Value},
    output::Termination,
    runner::Session,
};
use itertools::Itertools;

use super::Strategy;

/// Exhaustive search over every discrete candidate and an evenly spaced grid
/// of each continuous range.
pub struct GridTuner {
    steps: GridSteps,
}

impl GridTuner {
    pub fn new(steps: impl Into<GridSteps>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    fn axis(&self, name: &str, domain: &Domain) -> Result<Vec<Value>> {
        match domain {
            Domain::Discrete(candidates) => Ok(candidates.clone()),
            Domain::Continuous { range: (min, max) } => {
                let steps = self.steps.steps_for(name)?;
                if steps == 1 {
                    return Ok(vec![Value::Float(*min)]);
                }
                let step_size = (max - min) / (steps - 1) as f64;
                Ok((0..steps)
                    .map(|i| Value::Float((min + i as f64 * step_size).min(*max)))
                    .collect())
            }
        }
    }
}

impl Strategy for GridTuner {
    fn tune_impl(&self, session: &mut Session<'_>) -> Result<Termination> {
        let search_space = session.search_space();
        let names = search_space.names().collect::<Vec<_>>();
        let axes = search_space
            .iter()
            .map(|(name, domain)| self.axis(name, domain))
            .collect::<Result<Vec<_>>>()?;

        let points: usize = axes.iter().map(Vec::len).product();
        session.log_msg(format_args!(
            "Grid of {} points, budget {}",
            points,
            session.budget()
        ));

        let grid = axes
            .into_iter()
            .map(|axis| axis.into_iter())
            .multi_cartesian_product();
        for point in grid {
            if session.is_exhausted() {
                return Ok(Termination::BudgetExhausted);
            }
            let config: Configuration = names
                .iter()
                .zip(point)
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            session.evaluate_config(&config)?;
        }
        Ok(Termination::Completed)
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::errors::TunerError;
    use crate::library::SearchSpace;
    use crate::runner::Tuner;

    fn space() -> SearchSpace {
        SearchSpace::builder()
            .add_choices("k", [1, 2, 3])
            .add_range("x", 0.0, 1.0)
            .build()
            .unwrap()
    }

    fn score(config: &Configuration) -> f64 {
        let x = config.get_f64("x").unwrap_or_default();
        config.get_f64("k").unwrap_or_default() - (x - 0.5).powi(2)
    }

    #[test]
    fn visits_every_grid_point() {
        let tuner = Tuner::new(space(), score, 100);
        let result = tuner.tune(&GridTuner::new(3)).unwrap();

        assert_eq!(result.termination, Termination::Completed);
        assert_eq!(result.cost, 9);
        let xs = result
            .evaluations
            .iter()
            .filter_map(|e| e.config.get_f64("x"))
            .unique_by(|x| x.to_bits())
            .sorted_by(|a, b| a.total_cmp(b))
            .collect::<Vec<_>>();
        assert_eq!(xs, vec![0.0, 0.5, 1.0]);

        let best = result.best_config().unwrap();
        assert_eq!(best.get("k"), Some(&Value::Integer(3)));
        assert_eq!(best.get_f64("x"), Some(0.5));
    }

    #[test]
    fn stops_at_budget() {
        let tuner = Tuner::new(space(), score, 4);
        let result = tuner.tune(&GridTuner::new(5)).unwrap();

        assert_eq!(result.termination, Termination::BudgetExhausted);
        assert_eq!(result.cost, 4);
    }

    #[test]
    fn single_step_uses_range_start() {
        let tuner = Tuner::new(space(), score, 100);
        let result = tuner.tune(&GridTuner::new(1)).unwrap();
        assert_eq!(result.cost, 3);
        assert!(result
            .evaluations
            .iter()
            .all(|e| e.config.get_f64("x") == Some(0.0)));
    }

    #[test]
    fn missing_per_parameter_steps_fail_before_scoring() {
        let calls = Cell::new(0);
        let tuner = Tuner::new(
            space(),
            |c: &Configuration| {
                calls.set(calls.get() + 1);
                score(c)
            },
            100,
        );
        let steps: BTreeMap<String, usize> = BTreeMap::from([("y".to_string(), 4)]);
        let err = tuner.tune(&GridTuner::new(steps)).unwrap_err();

        assert!(matches!(err, TunerError::InvalidOption { name: "steps", .. }));
        assert_eq!(calls.get(), 0);
    }
}
