use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw event as delivered by the hosting platform. `body` is itself JSON.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InboundRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct InboundPayload {
    pub args: InvokeArgs,
    pub secrets: Secrets,
}

#[derive(Debug, Deserialize)]
pub struct InvokeArgs {
    pub scrapegraph_function: String,
    pub link: String,
    #[serde(default)]
    pub optional_argument: Option<String>,
}

#[derive(Deserialize)]
pub struct Secrets {
    #[serde(rename = "SGAI_API_KEY")]
    pub sgai_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("sgai_api_key", &"<redacted>")
            .finish()
    }
}

/// Error body returned by the dispatcher when a call fails.
#[derive(Debug, Serialize)]
pub struct ScrapeGraphResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeGraphResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}
