//! Admission workflow core for the university administrative portal.
//!
//! The crate exposes the status machine, record store and audit abstractions,
//! the service facade, and the axum router; binaries wire in concrete storage
//! and serve it.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
