/// Forum Service Library
///
/// Threaded discussion backend for the e-learning platform: posts with tags,
/// nested comments, toggling votes and a moderation gate backed by an
/// external text classifier.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Posts, tags, comments, votes and the comment forest
/// - `services`: Business logic, moderation and the classifier client
/// - `db`: Database access layer and repositories
/// - `auth`: Bearer token verification
/// - `middleware`: Authentication middleware and ownership policy
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
