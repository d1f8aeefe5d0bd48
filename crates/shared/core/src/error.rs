use thiserror::Error;

/// Domain-level errors for parsing and validating core types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Unknown market regime: {0}")]
    UnknownRegime(String),

    #[error("Unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter {name} is not finite: {value}")]
    NonFiniteParameter { name: String, value: f64 },
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
