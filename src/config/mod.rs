//! Configuration for the studbook client.
//!
//! ## config.kdl - User preferences
//!
//! Located at `~/.config/studbook/config.kdl` (platform config dir), or wherever
//! `--config` points.
//!
//! Contains:
//! - `api-url` - Base URL of the REST API
//! - `request-timeout-secs` - Per-request timeout (1-300)
//! - `token-file` - Where the session token is persisted
//! - `layout` - "horizontal" or "vertical" pedigree drawings
//! - `output-format` - "json" or "human"
//!
//! ## Token file
//!
//! The only durable state. Defaults to `<data dir>/token` and is written with
//! 0600 permissions (see [`crate::session::FileTokenStore`]).
//!
//! ## Precedence
//!
//! CLI flag > environment > config.kdl > defaults. Use the [`resolver`] module.

pub mod resolver;
pub mod schema;

pub use resolver::{
    API_URL_ENV, ConfigOverrides, DATA_DIR_ENV, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, Resolved,
    ResolvedConfig, TOKEN_FILE_ENV, ValueSource, data_dir, default_config_path, load_and_resolve,
    resolve_config,
};
pub use schema::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS, OutputFormat, StudbookConfig};
