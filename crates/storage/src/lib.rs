//! Storage adapters for the block subsystem
//!
//! - [`memory`]: thread-safe in-memory repositories (DashMap / RwLock),
//!   used by tests and short-lived drivers
//! - [`sqlite`]: single-file SQLite store implementing every port
//!
//! Both implement the same traits from `blocks-ports`, so components are
//! generic over the backend.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryBlockRepository, InMemoryErrorStream, InMemoryParameterRepository};
pub use sqlite::SqliteStore;
