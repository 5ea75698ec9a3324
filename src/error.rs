use thiserror::Error;

/// Errors raised while building a [`crate::CallTimeBudget`].
///
/// Denied extension requests are not errors; they come back as
/// [`crate::ExtensionResult::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("invalid budget configuration: {0}")]
    InvalidConfiguration(String),
}
