//! Adaptive Blocks Ports
//!
//! Trait definitions for every collaborator the block subsystem touches.
//! Implementations live in `blocks-storage` (in-memory and SQLite).
//!
//! ```text
//!   ErrorStream ──read──▶ Segmenter ──save_blocks──▶ BlockRepository
//!                                                        │
//!                                          Classifier ◀──┘
//!                                              │
//!               ParameterRepository ◀── Parameter Store ──▶ OptimizationLog
//! ```
//!
//! All ports are synchronous and `Send + Sync`.

pub mod block_repository;
pub mod error;
pub mod error_stream;
pub mod parameter_repository;

pub use block_repository::{BlockQuery, BlockReader, BlockRepository, BlockWriter};
pub use error::{StoreError, StoreResult};
pub use error_stream::{ErrorQuery, ErrorStream, ErrorStreamWriter};
pub use parameter_repository::{
    OptimizationLog, ParameterReader, ParameterRepository, ParameterWriter,
};
