use std::fmt::Display;
use std::time::Instant;

use crate::config::BudgetPolicy;
use crate::errors::Result;
use crate::library::{Configuration, Direction, Scorer, SearchSpace};
use crate::output::{Evaluation, TuneResult};
use crate::runners::Strategy;

/// Budgeted wrapper around a user scoring function.
///
/// A `Tuner` is reusable: every call to [`Tuner::tune`] starts a fresh
/// [`Session`] with zero cost and no best result.
pub struct Tuner<S: Scorer> {
    search_space: SearchSpace,
    scorer: S,
    budget: u64,
    direction: Direction,
    budget_policy: BudgetPolicy,
    verbose: bool,
}

impl<S: Scorer> Tuner<S> {
    pub fn new(search_space: SearchSpace, scorer: S, budget: u64) -> Self {
        Self {
            search_space,
            scorer,
            budget,
            direction: Direction::Maximize,
            budget_policy: BudgetPolicy::default(),
            verbose: false,
        }
    }

    pub fn maximize(mut self, maximize: bool) -> Self {
        self.direction = Direction::from_maximize(maximize);
        self
    }

    pub fn budget_policy(mut self, budget_policy: BudgetPolicy) -> Self {
        self.budget_policy = budget_policy;
        self
    }

    /// Report progress messages at info level instead of debug.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    pub fn tune(&self, strategy: &dyn Strategy) -> Result<TuneResult> {
        let mut session = Session::new(
            &self.search_space,
            &self.scorer,
            self.budget,
            self.direction,
            self.budget_policy,
            self.verbose,
        );
        let termination = strategy.tune_impl(&mut session)?;
        session.log_msg(format_args!(
            "{} finished ({:?}) after {}/{} evaluations",
            strategy.name(),
            termination,
            session.cost,
            session.budget
        ));
        Ok(TuneResult {
            strategy: strategy.name().to_string(),
            direction: self.direction,
            budget: self.budget,
            cost: session.cost,
            termination,
            best: session.best,
            evaluations: session.evaluations,
        })
    }
}

/// Shared state of one `tune` call: cost accounting and best tracking.
pub struct Session<'a> {
    search_space: &'a SearchSpace,
    scorer: &'a dyn Scorer,
    budget: u64,
    direction: Direction,
    budget_policy: BudgetPolicy,
    verbose: bool,
    cost: u64,
    best: Option<Evaluation>,
    evaluations: Vec<Evaluation>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        search_space: &'a SearchSpace,
        scorer: &'a dyn Scorer,
        budget: u64,
        direction: Direction,
        budget_policy: BudgetPolicy,
        verbose: bool,
    ) -> Self {
        Self {
            search_space,
            scorer,
            budget,
            direction,
            budget_policy,
            verbose,
            cost: 0,
            best: None,
            evaluations: Vec::new(),
        }
    }

    pub fn search_space(&self) -> &'a SearchSpace {
        self.search_space
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn budget_policy(&self) -> BudgetPolicy {
        self.budget_policy
    }

    pub fn is_exhausted(&self) -> bool {
        self.cost >= self.budget
    }

    /// Whether a sub-routine that is already running may spend one more evaluation.
    pub fn allows_inner_evaluation(&self) -> bool {
        match self.budget_policy {
            BudgetPolicy::Soft => true,
            BudgetPolicy::Strict => !self.is_exhausted(),
        }
    }

    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        self.direction.is_better(candidate, incumbent)
    }

    pub fn is_worse(&self, candidate: f64, incumbent: f64) -> bool {
        self.direction.is_worse(candidate, incumbent)
    }

    pub fn best(&self) -> Option<&Evaluation> {
        self.best.as_ref()
    }

    /// Scores `config`, charges one unit of budget and updates the best result.
    pub fn evaluate_config(&mut self, config: &Configuration) -> Result<f64> {
        self.search_space.validate_config(config)?;

        let start = Instant::now();
        let score = self.scorer.score(config);
        let elapsed_secs = start.elapsed().as_secs_f64();
        self.cost += 1;
        log::debug!("Function evaluated {}/{}", self.cost, self.budget);

        let evaluation = Evaluation {
            config: config.clone(),
            score,
            elapsed_secs,
        };
        let improved = match self.best {
            Some(ref best) => self.direction.is_better(score, best.score),
            None => true,
        };
        if improved {
            log::debug!("New best score {} at {}", score, config);
            self.best = Some(evaluation.clone());
        }
        self.evaluations.push(evaluation);
        Ok(score)
    }

    /// Progress side-channel. Never influences the search.
    pub fn log_msg(&self, message: impl Display) {
        if self.verbose {
            log::info!("{}", message);
        } else {
            log::debug!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TunerError;
    use crate::library::Value;

    fn space() -> SearchSpace {
        SearchSpace::builder()
            .add_range("x", 0.0, 10.0)
            .add_choices("k", [1, 2, 3])
            .build()
            .unwrap()
    }

    fn config(x: f64, k: i64) -> Configuration {
        [
            ("x".to_string(), Value::Float(x)),
            ("k".to_string(), Value::Integer(k)),
        ]
        .into_iter()
        .collect()
    }

    fn score(config: &Configuration) -> f64 {
        config.get_f64("x").unwrap_or_default() * config.get_f64("k").unwrap_or_default()
    }

    #[test]
    fn evaluate_config_counts_cost_and_tracks_best() {
        let space = space();
        let mut session = Session::new(
            &space,
            &score,
            10,
            Direction::Maximize,
            BudgetPolicy::Soft,
            false,
        );

        assert_eq!(session.evaluate_config(&config(2.0, 1)).unwrap(), 2.0);
        assert_eq!(session.evaluate_config(&config(3.0, 3)).unwrap(), 9.0);
        assert_eq!(session.evaluate_config(&config(4.0, 2)).unwrap(), 8.0);

        assert_eq!(session.cost(), 3);
        assert_eq!(session.evaluations.len(), 3);
        let best = session.best().unwrap();
        assert_eq!(best.score, 9.0);
        assert_eq!(best.config, config(3.0, 3));
    }

    #[test]
    fn minimize_keeps_lowest_score() {
        let space = space();
        let mut session = Session::new(
            &space,
            &score,
            10,
            Direction::Minimize,
            BudgetPolicy::Soft,
            false,
        );
        session.evaluate_config(&config(5.0, 1)).unwrap();
        session.evaluate_config(&config(1.0, 2)).unwrap();
        session.evaluate_config(&config(9.0, 3)).unwrap();
        assert_eq!(session.best().map(|b| b.score), Some(2.0));
    }

    #[test]
    fn evaluate_config_rejects_malformed_configuration_without_charging() {
        let space = space();
        let mut session = Session::new(
            &space,
            &score,
            10,
            Direction::Maximize,
            BudgetPolicy::Soft,
            false,
        );
        let mut incomplete = Configuration::new();
        incomplete.set("x", Value::Float(1.0));

        assert!(matches!(
            session.evaluate_config(&incomplete),
            Err(TunerError::InvalidConfiguration(_))
        ));
        assert_eq!(session.cost(), 0);
        assert!(session.best().is_none());
    }

    #[test]
    fn evaluations_may_run_past_budget() {
        let space = space();
        let mut session = Session::new(
            &space,
            &score,
            1,
            Direction::Maximize,
            BudgetPolicy::Soft,
            false,
        );
        session.evaluate_config(&config(1.0, 1)).unwrap();
        assert!(session.is_exhausted());
        assert!(session.allows_inner_evaluation());
        session.evaluate_config(&config(2.0, 1)).unwrap();
        assert_eq!(session.cost(), 2);

        let mut strict = Session::new(
            &space,
            &score,
            1,
            Direction::Maximize,
            BudgetPolicy::Strict,
            false,
        );
        strict.evaluate_config(&config(1.0, 1)).unwrap();
        assert!(!strict.allows_inner_evaluation());
    }
}
