use thiserror::Error;

/// Errors raised by marginal construction and the toolkit operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarginalError {
    /// Malformed marginal, out-of-range probability, undefined transform or bad configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Density queried outside the support under [`SupportPolicy::Strict`](crate::SupportPolicy::Strict).
    #[error("x = {x} lies outside the support [{lower}, {upper}]")]
    OutOfSupport { x: f64, lower: f64, upper: f64 },
    #[error("no marginal named `{name}`")]
    UnknownMarginal { name: String },
    #[error("no fitted value at index {index}")]
    UnknownIndex { index: usize },
}

impl MarginalError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MarginalError>;
