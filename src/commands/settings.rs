//! `config show`.

use serde::Serialize;

use super::{CommandResult, Context, json_string};
use crate::config::{Resolved, ResolvedConfig};

#[derive(Debug, Serialize)]
pub struct SourcedValue {
    pub value: String,
    pub source: String,
}

impl<T: ToString> From<&Resolved<T>> for SourcedValue {
    fn from(resolved: &Resolved<T>) -> Self {
        Self {
            value: resolved.value.to_string(),
            source: resolved.source.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigShow {
    pub api_url: SourcedValue,
    pub request_timeout_secs: SourcedValue,
    pub token_file: SourcedValue,
    pub layout: SourcedValue,
    pub output_format: SourcedValue,
}

impl ConfigShow {
    fn entries(&self) -> [(&'static str, &SourcedValue); 5] {
        [
            ("api-url", &self.api_url),
            ("request-timeout-secs", &self.request_timeout_secs),
            ("token-file", &self.token_file),
            ("layout", &self.layout),
            ("output-format", &self.output_format),
        ]
    }
}

impl CommandResult for ConfigShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        self.entries()
            .iter()
            .map(|(key, v)| format!("{:<22} {}  ({})", key, v.value, v.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolved configuration with the source of every value.
pub fn config_show(ctx: &Context) -> ConfigShow {
    show(&ctx.config)
}

fn show(config: &ResolvedConfig) -> ConfigShow {
    let token_file = Resolved::new(
        config.token_file.value.display().to_string(),
        config.token_file.source.clone(),
    );
    ConfigShow {
        api_url: (&config.api_url).into(),
        request_timeout_secs: (&config.request_timeout_secs).into(),
        token_file: (&token_file).into(),
        layout: (&config.layout).into(),
        output_format: (&config.output_format).into(),
    }
}
