use blocks_core::ParameterSet;
use blocks_ports::StoreError;
use thiserror::Error;

/// Errors raised while resolving or optimizing parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The set was computed but could not be written; it is still usable
    #[error("Parameters for {formula_id} computed but not persisted: {source}")]
    PersistFailed {
        formula_id: String,
        parameters: ParameterSet,
        source: StoreError,
    },
}

impl ParameterError {
    /// Computed parameters carried by a persistence failure
    pub fn parameters(&self) -> Option<&ParameterSet> {
        match self {
            ParameterError::PersistFailed { parameters, .. } => Some(parameters),
            ParameterError::Store(_) => None,
        }
    }
}

pub type ParameterResult<T> = std::result::Result<T, ParameterError>;
