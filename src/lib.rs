//! Medication reminder service: turns regimens into scheduled dose reminders
//! and e-mails each one close to its due time.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

#[cfg(test)]
mod test_support;
