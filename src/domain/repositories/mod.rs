pub mod dosage_repository;
pub mod error;
pub mod regimen_repository;
pub mod task_repository;

pub use dosage_repository::DosageRepository;
pub use error::RepositoryError;
pub use regimen_repository::{RegimenDetailsLookup, RegimenRepository};
pub use task_repository::TaskRepository;
