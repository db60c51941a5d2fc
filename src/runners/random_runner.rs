use rand::{rngs::ThreadRng, thread_rng, Rng};

use crate::{
    errors::Result,
    library::{Configuration, SearchSpace},
    output::Termination,
    runner::Session,
};

use super::Strategy;

/// Uniform random search.
///
/// Also used on its own as a sampler by strategies that need a random
/// starting point.
pub struct RandomTuner<R: Rng + Clone = ThreadRng> {
    rng: R,
}

impl RandomTuner {
    pub fn new() -> Self {
        Self { rng: thread_rng() }
    }

    /// Draws `n` independent configurations. Spends no budget.
    pub fn generate_configs(
        search_space: &SearchSpace,
        n: usize,
        rng: &mut impl Rng,
    ) -> Vec<Configuration> {
        (0..n).map(|_| sample_config(search_space, rng)).collect()
    }
}

impl Default for RandomTuner {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + Clone> RandomTuner<R> {
    pub fn new_with_rng(rng: R) -> Self {
        Self { rng }
    }
}

pub(crate) fn sample_config<R: Rng>(search_space: &SearchSpace, rng: &mut R) -> Configuration {
    search_space
        .iter()
        .map(|(name, domain)| (name.to_string(), domain.random_value(rng)))
        .collect()
}

impl<R: Rng + Clone> Strategy for RandomTuner<R> {
    fn tune_impl(&self, session: &mut Session<'_>) -> Result<Termination> {
        let search_space = session.search_space();
        let mut rng = self.rng.clone();

        while !session.is_exhausted() {
            let config = sample_config(search_space, &mut rng);
            session.evaluate_config(&config)?;
        }
        Ok(Termination::BudgetExhausted)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
