//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The Rust struct representing the file
//! - Conversion to and from KDL documents
//! - Validation and loading

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::view::Orientation;
use crate::{Error, Result};

/// Smallest accepted request timeout, in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;
/// Largest accepted request timeout, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// api-url "https://studbook.example.com"
/// request-timeout-secs 30
/// token-file "/home/me/.local/share/studbook/token"
/// layout "horizontal"  // or "vertical"
/// output-format "human"  // or "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudbookConfig {
    /// Base URL of the REST API, without the `/api/v1` suffix
    pub api_url: Option<String>,

    /// Per-request timeout
    pub request_timeout_secs: Option<u64>,

    /// Where the session token is persisted
    pub token_file: Option<String>,

    /// Pedigree drawing orientation
    pub layout: Option<Orientation>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl StudbookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(secs) = self.request_timeout_secs
            && !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&secs)
        {
            return Err(format!(
                "request-timeout-secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, secs
            ));
        }
        if let Some(ref url) = self.api_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(format!("api-url must start with http:// or https://, got {}", url));
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes are ignored. A known key with a missing value or a value
    /// of the wrong type or spelling is an error naming the key.
    pub fn from_kdl(doc: &KdlDocument) -> std::result::Result<Self, String> {
        let mut config = Self::new();

        config.api_url = first_string(doc, "api-url")?;
        config.token_file = first_string(doc, "token-file")?;

        if let Some(value) = first_value(doc, "request-timeout-secs")? {
            let secs = value
                .as_integer()
                .and_then(|i| u64::try_from(i).ok())
                .ok_or_else(|| {
                    format!("request-timeout-secs must be a whole number of seconds, got {}", value)
                })?;
            config.request_timeout_secs = Some(secs);
        }

        if let Some(layout) = first_string(doc, "layout")? {
            let orientation = Orientation::parse(&layout).ok_or_else(|| {
                format!("layout must be \"horizontal\" or \"vertical\", got {:?}", layout)
            })?;
            config.layout = Some(orientation);
        }
        if let Some(format) = first_string(doc, "output-format")? {
            let format = OutputFormat::parse(&format).ok_or_else(|| {
                format!("output-format must be \"json\" or \"human\", got {:?}", format)
            })?;
            config.output_format = Some(format);
        }

        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.api_url {
            push_string(&mut doc, "api-url", url);
        }
        if let Some(secs) = self.request_timeout_secs {
            let mut node = KdlNode::new("request-timeout-secs");
            node.push(KdlEntry::new(KdlValue::Integer(secs as i128)));
            doc.nodes_mut().push(node);
        }
        if let Some(ref path) = self.token_file {
            push_string(&mut doc, "token-file", path);
        }
        if let Some(layout) = self.layout {
            push_string(&mut doc, "layout", layout.as_str());
        }
        if let Some(format) = self.output_format {
            push_string(&mut doc, "output-format", format.as_str());
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &StudbookConfig) {
        if other.api_url.is_some() {
            self.api_url = other.api_url.clone();
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.token_file.is_some() {
            self.token_file = other.token_file.clone();
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
    }

    /// Read and validate a config file.
    ///
    /// A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let doc: KdlDocument = content.parse().map_err(|e| {
            Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e))
        })?;

        let config = Self::from_kdl(&doc)
            .and_then(|config| config.validate().map(|()| config))
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// First argument of node `name`; `None` when the node is absent.
fn first_value<'d>(
    doc: &'d KdlDocument,
    name: &str,
) -> std::result::Result<Option<&'d KdlValue>, String> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    match node.entries().first() {
        Some(entry) => Ok(Some(entry.value())),
        None => Err(format!("{} needs a value", name)),
    }
}

fn first_string(doc: &KdlDocument, name: &str) -> std::result::Result<Option<String>, String> {
    match first_value(doc, name)? {
        None => Ok(None),
        Some(value) => value
            .as_string()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| format!("{} must be a string, got {}", name, value)),
    }
}

fn push_string(doc: &mut KdlDocument, name: &str, value: &str) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    doc.nodes_mut().push(node);
}
