use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST {shorten path}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortenRequest {
    pub url: String,
    /// Serve an interstitial page instead of redirecting. Also sent as `?preview=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
}

impl ShortenRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = Some(preview);
        self
    }

    pub(crate) fn wants_preview(&self) -> bool {
        self.preview == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    #[serde(default)]
    pub preview_enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub click_count: Option<u64>,
}

/// An RFC 7807 problem document as returned for failed requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub properties: Option<ProblemProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemProperties {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProblemDetails {
    /// Parse a problem document, accepting only bodies anchored by a string `title` or a numeric
    /// `status`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
        let anchored = value.get("title").is_some_and(|t| t.is_string())
            || value.get("status").is_some_and(|s| s.is_u64());
        if !anchored {
            return None;
        }

        serde_json::from_value(value).ok()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.properties.as_ref()?.request_id.as_deref()
    }

    /// The message to show for a failed request.
    pub fn message(problem: Option<&Self>, status: u16) -> String {
        problem
            .and_then(|p| p.title.clone().or_else(|| p.detail.clone()))
            .unwrap_or_else(|| format!("Request failed ({status})"))
    }
}
