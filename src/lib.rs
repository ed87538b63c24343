//! Studbook - client library for a pedigree registry service.
//!
//! This library provides the core functionality for the `studbook` CLI and the
//! browser viewer: pedigree tree construction and drawing, session handling,
//! route access gating for trial and subscription accounts, and the REST client.

pub mod access;
pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod commands;
pub mod config;
pub mod models;
pub mod session;
pub mod view;
pub mod wasm;

/// Library-level error type for studbook operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Api(#[from] api::ApiError),

    /// Navigation refused by the access gate; carries the redirect target
    #[error("Access to {path} denied: redirected to {target}")]
    AccessDenied { path: String, target: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for studbook operations.
pub type Result<T> = std::result::Result<T, Error>;
