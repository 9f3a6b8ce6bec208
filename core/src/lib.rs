//! loanbook-core: analytical query catalog for the consumer-loan dataset,
//! plus the harness that runs it against a reset SQLite database.

pub mod age_correction;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod grading;
pub mod queries;
pub mod question;
pub mod result_set;
pub mod rng;
pub mod section;
pub mod store;
pub mod timezone;
pub mod types;
pub mod verify;
