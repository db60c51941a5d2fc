use std::{fs::File, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::library::{Configuration, Direction};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub config: Configuration,
    pub score: f64,
    pub elapsed_secs: f64,
}

/// Why a strategy stopped issuing evaluations.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// The step size decayed below the convergence threshold.
    Converged,
    BudgetExhausted,
    /// The strategy ran out of candidates before the budget did.
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TuneResult {
    pub strategy: String,
    pub direction: Direction,
    pub budget: u64,
    pub cost: u64,
    pub termination: Termination,
    pub best: Option<Evaluation>,
    pub evaluations: Vec<Evaluation>,
}

impl TuneResult {
    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|e| e.score)
    }

    pub fn best_config(&self) -> Option<&Configuration> {
        self.best.as_ref().map(|e| &e.config)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let writer = File::options()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("failed to write tuning result to {}", path.display()))?;
        Ok(())
    }
}
