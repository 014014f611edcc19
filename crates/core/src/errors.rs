use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("unknown {kind} category `{value}`")]
    UnknownCategory { kind: &'static str, value: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{key}` was not found")]
    NotFound { entity: &'static str, key: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class used in command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvariantViolation(_)) => "invalid_input",
            Self::Domain(DomainError::UnknownCategory { .. }) => "unknown_category",
            Self::NotFound { .. } => "not_found",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The request could not be processed. Check inputs and try again.",
            Self::NotFound { .. } => "The requested record does not exist.",
            Self::Persistence(_) => "The data store is temporarily unavailable. Please retry shortly.",
            Self::Configuration(_) => "The application is misconfigured.",
        }
    }
}
