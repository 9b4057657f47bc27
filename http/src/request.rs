//! Outbound request descriptor carried by HTTP ammo

use serde::{Deserialize, Serialize};

/// The protocol-specific payload of one HTTP ammo item.
///
/// Decoders produce these; the transport turns them into real client
/// requests at shot time. Kept as plain data so pooled ammo slots can hold
/// them without tying the pipeline to any particular HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method, e.g. `GET`.
    pub method: String,

    /// Absolute target URL.
    pub url: String,

    /// Header name/value pairs, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,

    /// Optional request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A bodyless GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST request with the given body.
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
