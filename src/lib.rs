// Library interface for the recording backend

pub mod auth;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod queries;
pub mod repository;
pub mod schema;
pub mod serve;
pub mod transcription;
pub mod users;

// Re-export the expected database version for convenience
pub use constants::EXPECTED_DB_VERSION;
pub use error::{Error, Result};
