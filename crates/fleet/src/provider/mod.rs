//! In-memory collaborator implementations.

pub mod memory_repository;
pub mod static_directory;

pub use memory_repository::MemoryRepository;
pub use static_directory::StaticDirectory;
