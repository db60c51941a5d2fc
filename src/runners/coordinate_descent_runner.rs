use rand::{rngs::ThreadRng, thread_rng, Rng};

use crate::{
    config::{
        BudgetPolicy, CoordinateDescentOptions, InitMethod, CONVERGENCE_THRESHOLD,
        LINE_SEARCH_BUDGET,
    },
    errors::{Result, TunerError},
    library::{Configuration, Domain, SearchSpace, Value},
    output::Termination,
    runner::Session,
};

use super::{random_runner::sample_config, Strategy};

/// Coordinate descent over a mixed discrete/continuous search space.
///
/// Each round visits the coordinates in lexicographic order. A discrete
/// coordinate tries every other candidate and keeps the strictly best one; a
/// continuous coordinate runs [`line_search`] with the current step fraction
/// `alpha` and a sub-budget of [`LINE_SEARCH_BUDGET`] evaluations. A round in
/// which no coordinate moves multiplies `alpha` by `decay_rate`; the search
/// has converged once `alpha` drops below [`CONVERGENCE_THRESHOLD`].
///
/// Under [`BudgetPolicy::Soft`] the budget is checked only between
/// coordinates, so the last coordinate of a run may overshoot it by up to one
/// discrete sweep or one line search.
pub struct CoordinateDescentTuner<R: Rng + Clone = ThreadRng> {
    options: CoordinateDescentOptions,
    rng: R,
}

impl CoordinateDescentTuner {
    pub fn new(options: CoordinateDescentOptions) -> Self {
        Self {
            options,
            rng: thread_rng(),
        }
    }
}

impl<R: Rng + Clone> CoordinateDescentTuner<R> {
    /// Uses `rng` for the `random` init method.
    pub fn new_with_rng(options: CoordinateDescentOptions, rng: R) -> Self {
        Self { options, rng }
    }

    fn initial_config(
        &self,
        search_space: &SearchSpace,
        init_method: InitMethod,
    ) -> Result<Configuration> {
        match init_method {
            InitMethod::Average => search_space
                .iter()
                .map(|(name, domain)| {
                    domain
                        .initial_value()
                        .map(|value| (name.to_string(), value))
                        .ok_or_else(|| TunerError::InvalidSearchSpace {
                            name: name.to_string(),
                            reason: "discrete parameter has no candidates".to_string(),
                        })
                })
                .collect(),
            InitMethod::Random => {
                let mut rng = self.rng.clone();
                Ok(sample_config(search_space, &mut rng))
            }
        }
    }
}

impl<R: Rng + Clone> Strategy for CoordinateDescentTuner<R> {
    fn tune_impl(&self, session: &mut Session<'_>) -> Result<Termination> {
        let params = self.options.validate()?;
        if session.budget() == 0 && session.budget_policy() == BudgetPolicy::Strict {
            return Err(TunerError::NoBudget);
        }

        let search_space = session.search_space();
        let coordinates = search_space.iter().collect::<Vec<_>>();
        let mut config = self.initial_config(search_space, params.init_method)?;
        let mut cur_score = session.evaluate_config(&config)?;
        let mut alpha = params.alpha;
        let mut rounds = 0u64;

        while !session.is_exhausted() {
            session.log_msg(format_args!(
                "Round {}, current cost {}",
                rounds,
                session.cost()
            ));
            let mut changed = false;
            let mut visited_all = true;

            for &(coordinate, domain) in &coordinates {
                if coordinate_budget_spent(session) {
                    visited_all = false;
                    break;
                }
                session.log_msg(format_args!(
                    "Coordinate {}, current cost {}",
                    coordinate,
                    session.cost()
                ));

                match domain {
                    Domain::Discrete(candidates) => {
                        let orig = current_value(&config, coordinate)?;
                        let (best_choice, best_score) = sweep_discrete(
                            session,
                            &mut config,
                            coordinate,
                            candidates,
                            cur_score,
                        )?;
                        session.log_msg(format_args!("Old: {}, new: {}", orig, best_choice));
                        changed |= best_choice != orig;
                        cur_score = best_score;
                    }
                    Domain::Continuous { .. } => {
                        let orig = current_f64(&config, coordinate)?;
                        let (best_value, best_score) = line_search(
                            session,
                            &mut config,
                            coordinate,
                            alpha,
                            LINE_SEARCH_BUDGET,
                            cur_score,
                        )?;
                        session.log_msg(format_args!("Old: {}, new: {}", orig, best_value));
                        changed |= best_value != orig;
                        cur_score = best_score;
                    }
                }
            }

            // Only a complete round without movement decays alpha.
            if visited_all && !changed {
                alpha *= params.decay_rate;
                session.log_msg(format_args!(
                    "New alpha: {}, current cost {}",
                    alpha,
                    session.cost()
                ));
                if alpha < CONVERGENCE_THRESHOLD {
                    return Ok(Termination::Converged);
                }
            }
            rounds += 1;
        }
        Ok(Termination::BudgetExhausted)
    }

    fn name(&self) -> &'static str {
        "coordinate_descent"
    }
}

/// Budget check made before each coordinate of a round.
fn coordinate_budget_spent(session: &Session<'_>) -> bool {
    match session.budget_policy() {
        BudgetPolicy::Soft => session.cost() > session.budget(),
        BudgetPolicy::Strict => session.is_exhausted(),
    }
}

fn current_value(config: &Configuration, coordinate: &str) -> Result<Value> {
    config.get(coordinate).cloned().ok_or_else(|| {
        TunerError::InvalidConfiguration(format!("missing parameter {coordinate}"))
    })
}

fn current_f64(config: &Configuration, coordinate: &str) -> Result<f64> {
    config.get_f64(coordinate).ok_or_else(|| {
        TunerError::InvalidConfiguration(format!("{coordinate} has no numeric value"))
    })
}

/// Tries every candidate other than the current one and leaves `config` at
/// the strictly best of them, or at the current value if none improves on
/// `cur_score`.
fn sweep_discrete(
    session: &mut Session<'_>,
    config: &mut Configuration,
    coordinate: &str,
    candidates: &[Value],
    cur_score: f64,
) -> Result<(Value, f64)> {
    let orig = current_value(config, coordinate)?;
    let mut best_choice = orig.clone();
    let mut best_score = cur_score;

    for choice in candidates {
        if *choice == orig {
            continue;
        }
        if !session.allows_inner_evaluation() {
            break;
        }
        config.set(coordinate, choice.clone());
        let score = session.evaluate_config(config)?;
        if session.is_better(score, best_score) {
            best_choice = choice.clone();
            best_score = score;
        }
    }

    config.set(coordinate, best_choice.clone());
    Ok((best_choice, best_score))
}

/// Optimizes the continuous `coordinate` of `config`, all other coordinates
/// held fixed.
///
/// With `Y` the width of the coordinate's range and `delta = epsilon * Y`,
/// the first step that fits in the range and strictly improves on
/// `cur_score` (`+delta`, then `-delta`) picks the direction. The search then
/// keeps stepping by `delta` while the score does not get worse than the
/// previous step, stopping at the range boundary, at the first worse step
/// (which is undone), or after `budget` evaluations.
///
/// Returns the accepted value and its score; `config` is left holding that
/// value. When no step helps, or `delta` cannot fit on either side, the
/// original value and `cur_score` come back unchanged.
pub fn line_search(
    session: &mut Session<'_>,
    config: &mut Configuration,
    coordinate: &str,
    epsilon: f64,
    budget: u64,
    cur_score: f64,
) -> Result<(f64, f64)> {
    let (min, max) = session
        .search_space()
        .get(coordinate)
        .and_then(Domain::bounds)
        .ok_or_else(|| {
            TunerError::InvalidConfiguration(format!("{coordinate} is not a continuous parameter"))
        })?;
    let orig = current_f64(config, coordinate)?;
    let delta = epsilon * (max - min);
    let fits = |value: f64| min <= value && value <= max;

    if !(delta > 0.) || (!fits(orig + delta) && !fits(orig - delta)) {
        return Ok((orig, cur_score));
    }

    let mut local_cost = 0;
    let mut direction = None;
    for step in [delta, -delta] {
        if local_cost >= budget || !session.allows_inner_evaluation() {
            break;
        }
        if !fits(orig + step) {
            continue;
        }
        config.set(coordinate, Value::Float(orig + step));
        let score = session.evaluate_config(config)?;
        local_cost += 1;
        if session.is_better(score, cur_score) {
            direction = Some((step, score));
            break;
        }
    }

    let (step, mut prev_score) = match direction {
        Some(found) => found,
        None => {
            config.set(coordinate, Value::Float(orig));
            return Ok((orig, cur_score));
        }
    };

    let mut cur_val = orig + step;
    while local_cost < budget && session.allows_inner_evaluation() {
        let next = cur_val + step;
        if !fits(next) {
            break;
        }
        config.set(coordinate, Value::Float(next));
        let score = session.evaluate_config(config)?;
        local_cost += 1;
        if session.is_worse(score, prev_score) {
            break;
        }
        cur_val = next;
        prev_score = score;
    }

    config.set(coordinate, Value::Float(cur_val));
    Ok((cur_val, prev_score))
}
