mod block_repository;
mod error_stream;
mod parameter_repository;

pub use block_repository::InMemoryBlockRepository;
pub use error_stream::InMemoryErrorStream;
pub use parameter_repository::InMemoryParameterRepository;
