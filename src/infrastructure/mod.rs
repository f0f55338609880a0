pub mod config;
pub mod database;
pub mod notifications;
pub mod repositories;
pub mod scheduler;
