mod row_mapping;
pub mod sqlite_dosage_repository;
pub mod sqlite_regimen_repository;
pub mod sqlite_task_repository;

pub use sqlite_dosage_repository::SqliteDosageRepository;
pub use sqlite_regimen_repository::SqliteRegimenRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
