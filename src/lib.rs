pub mod config;
pub mod errors;
pub mod library;
pub mod output;
pub mod runner;
pub mod runners;
pub use anyhow;

pub use config::{BudgetPolicy, CoordinateDescentOptions, GridSteps, InitMethod};
pub use errors::{Result, TunerError};
pub use library::{Configuration, Direction, Domain, Scorer, SearchSpace, Value};
pub use output::{Evaluation, Termination, TuneResult};
pub use runner::{Session, Tuner};
pub use runners::{
    coordinate_descent_runner::{line_search, CoordinateDescentTuner},
    grid_runner::GridTuner,
    random_runner::RandomTuner,
    Strategy,
};
