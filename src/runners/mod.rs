pub mod coordinate_descent_runner;
pub mod grid_runner;
pub mod random_runner;

use crate::errors::Result;
use crate::output::Termination;
use crate::runner::Session;

/// A search strategy driven by [`Tuner::tune`](crate::runner::Tuner::tune).
///
/// Implementations propose configurations and score them through
/// [`Session::evaluate_config`], which does the cost accounting and best
/// tracking for them. Option errors must be reported before the first
/// evaluation.
pub trait Strategy {
    fn tune_impl(&self, session: &mut Session<'_>) -> Result<Termination>;

    fn name(&self) -> &'static str;
}
