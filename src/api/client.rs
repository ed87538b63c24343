//! Blocking client for the studbook REST API.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{API_PREFIX, ApiError};
use crate::models::{
    Animal, AncestryPayload, Organization, OrganizationRegistration, SubscriptionPlan,
};

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("studbook/", env!("CARGO_PKG_VERSION"));

/// Body of a successful login.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer: None,
        }
    }

    /// Attach (or remove) the bearer token sent with requests.
    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/animals`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Organization login. Returns the raw access token.
    pub fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        self.request_token("/auth/login", email, password)
    }

    /// Administrator login. Returns the raw access token.
    pub fn admin_login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        self.request_token("/auth/admin/login", email, password)
    }

    /// Register a new organization.
    pub fn register_organization(
        &self,
        registration: &OrganizationRegistration,
    ) -> Result<(), ApiError> {
        self.post("/organizations", registration).map(|_| ())
    }

    pub fn list_animals(&self) -> Result<Vec<Animal>, ApiError> {
        self.get_json("/animals")
    }

    pub fn get_animal(&self, id: &str) -> Result<Animal, ApiError> {
        self.get_json(&format!("/animals/{}", encode_segment(id)))
    }

    /// Focal animal plus its flat ancestor list.
    pub fn fetch_ancestry(&self, id: &str) -> Result<AncestryPayload, ApiError> {
        self.get_json(&format!("/animals/{}/tree", encode_segment(id)))
    }

    pub fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, ApiError> {
        self.get_json("/plans")
    }

    /// All organizations (admin console).
    pub fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.get_json("/organizations")
    }

    fn request_token(&self, path: &str, email: &str, password: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.post(path, &body)?;
        let token: TokenResponse = response
            .into_json()
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(token.access_token)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        let request = request.set("Accept", "application/json");
        match &self.bearer {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(map_error)?;
        response
            .into_json()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn post(&self, path: &str, body: &impl serde::Serialize) -> Result<ureq::Response, ApiError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.authorize(self.agent.post(&url))
            .send_json(body)
            .map_err(map_error)
    }
}

fn map_error(error: ureq::Error) -> ApiError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ApiError::from_status(code, &body)
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

/// Percent-encode a path segment, leaving RFC 3986 unreserved characters as-is.
fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
