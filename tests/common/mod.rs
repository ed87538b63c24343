//! Common test utilities for studbook integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's stored session or config.kdl.

#![allow(dead_code)]

use assert_cmd::Command;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// API address nothing listens on; commands that reach the network fail fast.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9";

/// A test environment with isolated data storage.
///
/// Each `TestEnv` owns a temporary directory holding the session token
/// (via `STUDBOOK_DATA_DIR`) and an explicit config.kdl (via `STUDBOOK_CONFIG`),
/// so tests are parallel-safe and independent of the host's files.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty config.kdl.
    pub fn new() -> Self {
        let env = Self {
            dir: TempDir::new().unwrap(),
        };
        env.write_config(&format!("api-url \"{}\"\n", UNREACHABLE_API));
        env
    }

    /// Get a Command for the studbook binary with isolated storage.
    pub fn studbook(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_studbook"));
        cmd.current_dir(self.dir.path());
        cmd.env("STUDBOOK_DATA_DIR", self.dir.path());
        cmd.env("STUDBOOK_CONFIG", self.config_path());
        cmd.env_remove("STUDBOOK_API_URL");
        cmd.env_remove("STUDBOOK_TOKEN_FILE");
        cmd.env_remove("STUDBOOK_LOG");
        cmd
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.kdl")
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.path().join("token")
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_path(), contents).unwrap();
    }

    /// Store an unsigned token carrying `claims` as the session.
    pub fn store_token(&self, claims: &Value) {
        std::fs::write(self.token_path(), studbook::session::encode_unsigned(claims)).unwrap();
    }

    /// Store an organization session whose trial ends at `trial_ends`.
    pub fn login_organization(&self, trial_ends: DateTime<Utc>) {
        self.store_token(&json!({
            "sub": "17",
            "email": "haras@example.com",
            "name": "Haras Boa Vista",
            "role": "organization",
            "organization_id": 4,
            "is_trial_active": true,
            "trial_expiration_date": trial_ends.to_rfc3339(),
            "exp": (Utc::now() + Duration::hours(8)).timestamp(),
        }));
    }

    /// Store an administrator session.
    pub fn login_admin(&self) {
        self.store_token(&json!({
            "sub": "1",
            "email": "admin@example.com",
            "role": "admin",
            "exp": (Utc::now() + Duration::hours(8)).timestamp(),
        }));
    }

    /// Write an ancestry file and return its path.
    pub fn write_ancestry(&self, name: &str, payload: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(payload).unwrap()).unwrap();
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

/// A three-generation ancestry for the mare "Estrela".
pub fn estrela_ancestry() -> Value {
    json!({
        "animal": { "id": "X", "name": "Estrela", "gender": "female" },
        "ancestors": [
            { "id": "A", "name": "Trovão", "gender": "male", "parentId": "X" },
            { "id": "B", "name": "Brisa", "gender": "female", "parentId": "X" },
            { "id": "C", "name": "Relâmpago", "gender": "male", "parentId": "A" },
            { "id": "D", "name": "Garoa", "gender": "female", "parentId": "A" }
        ]
    })
}
