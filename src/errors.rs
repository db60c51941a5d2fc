use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunerError {
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("{0} is an invalid init_method (expected \"average\" or \"random\")")]
    UnknownInitMethod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid search space parameter {name}: {reason}")]
    InvalidSearchSpace { name: String, reason: String },

    /// Strict budget enforcement leaves no room for even the first evaluation.
    #[error("Budget is 0 under strict budget enforcement")]
    NoBudget,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TunerError>;
