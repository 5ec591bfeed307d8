//! HTTP services for depot: the file storage service, the analysis
//! service, and a thin gateway that fronts both.
//!
//! Each service is an axum [`Router`](axum::Router) built from shared
//! application state; the binary in `main.rs` picks which one to run.

pub mod api;
pub mod config;
pub mod error;
pub mod factory;

pub use config::DepotConfig;
pub use error::ServerError;
