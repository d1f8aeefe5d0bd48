use crate::config::ConfigError;
use blocks_core::DomainError;
use blocks_parameters::ParameterError;
use blocks_ports::StoreError;
use thiserror::Error;

/// Errors surfaced by a pipeline cycle
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Parameter error: {0}")]
    Parameters(#[from] ParameterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid parameters for {formula_id}: {source}")]
    InvalidParameters {
        formula_id: String,
        source: DomainError,
    },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
