use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::Config;
use crate::models::ScrapeGraphResponse;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "sgai-relay/0.1";
const API_KEY_HEADER: &str = "sgai-apikey";

const SMARTSCRAPER_PROMPT: &str = "Extract all relevant information from this webpage";
const SEARCHSCRAPER_PROMPT: &str = "Search and extract relevant information";
const CRAWL_PROMPT: &str = "Extract relevant information from this website";
const AGENTIC_PROMPT: &str = "Extract relevant information";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown ScrapeGraphAI function: {0}")]
    UnknownFunction(String),
    #[error("Invalid optional_argument JSON: {0}")]
    OptionalArgument(#[from] serde_json::Error),
    #[error("optional_argument must be a JSON object")]
    OptionalArgumentNotObject,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Request(String),
    #[error("Invalid JSON in response: {0}")]
    Decode(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// ── Function table ───────────────────────────────────────────────────────────

/// Remote operations exposed by the ScrapeGraphAI API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeGraphFunction {
    SmartScraper,
    SearchScraper,
    Crawl,
    AgenticScraper,
    Markdownify,
    Scrape,
}

impl FromStr for ScrapeGraphFunction {
    type Err = DispatchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "smartscraper" => Ok(Self::SmartScraper),
            "searchscraper" => Ok(Self::SearchScraper),
            "crawl" | "smartcrawler" => Ok(Self::Crawl),
            "agenticscraper" => Ok(Self::AgenticScraper),
            "markdownify" => Ok(Self::Markdownify),
            "scrape" => Ok(Self::Scrape),
            _ => Err(DispatchError::UnknownFunction(name.to_string())),
        }
    }
}

impl ScrapeGraphFunction {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::SmartScraper => "smartscraper",
            Self::SearchScraper => "searchscraper",
            Self::Crawl => "crawl",
            Self::AgenticScraper => "agenticscraper",
            Self::Markdownify => "markdownify",
            Self::Scrape => "scrape",
        }
    }

    /// Builds the request body: defaults for this function first, then every
    /// caller-supplied key on top. Overridden keys keep their default position.
    pub fn build_payload(self, link: &str, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut payload = Map::new();
        let mut set = |key: &str, value: Value| {
            payload.insert(key.to_string(), value);
        };

        match self {
            Self::SmartScraper => {
                set("website_url", json!(link));
                set(
                    "user_prompt",
                    first_truthy(overrides, &["user_prompt", "prompt"], SMARTSCRAPER_PROMPT),
                );
            }
            Self::SearchScraper => {
                set(
                    "user_prompt",
                    first_truthy(overrides, &["user_prompt", "prompt"], SEARCHSCRAPER_PROMPT),
                );
                set("num_results", json!(3));
            }
            Self::Crawl => {
                set("url", json!(link));
                set(
                    "prompt",
                    first_truthy(overrides, &["prompt", "user_prompt"], CRAWL_PROMPT),
                );
                set("extraction_mode", json!(true));
                set("cache_website", json!(true));
                set("depth", json!(2));
                set("max_pages", json!(10));
                set("same_domain_only", json!(true));
            }
            Self::AgenticScraper => {
                set("url", json!(link));
                set("steps", json!([]));
                set("use_session", json!(false));
                set("ai_extraction", json!(true));
                set(
                    "user_prompt",
                    first_truthy(overrides, &["user_prompt", "prompt"], AGENTIC_PROMPT),
                );
            }
            Self::Markdownify => {
                set("website_url", json!(link));
            }
            Self::Scrape => {
                set("website_url", json!(link));
                set("render_heavy_js", json!(false));
            }
        }

        for (key, value) in overrides {
            payload.insert(key.clone(), value.clone());
        }
        payload
    }
}

fn first_truthy(overrides: &Map<String, Value>, keys: &[&str], default: &str) -> Value {
    keys.iter()
        .filter_map(|key| overrides.get(*key))
        .find(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| json!(default))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Absent or empty input means no overrides.
pub fn parse_optional_args(raw: Option<&str>) -> Result<Map<String, Value>, DispatchError> {
    match raw {
        None | Some("") => Ok(Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(DispatchError::OptionalArgumentNotObject),
        },
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: Url,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self, DispatchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.insecure_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Runs one call and always yields a pretty-printed JSON string: the
    /// remote result verbatim, or a `{ "success": false, "error": ... }` body.
    pub async fn dispatch(
        &self,
        function_name: &str,
        link: &str,
        api_key: &str,
        optional_argument: Option<&str>,
    ) -> String {
        tracing::info!(function = function_name, link, "calling ScrapeGraphAI function");

        match self.call(function_name, link, api_key, optional_argument).await {
            Ok(result) => pretty(&result),
            Err(e) => {
                tracing::error!(function = function_name, error = %e, "ScrapeGraphAI call failed");
                pretty(&ScrapeGraphResponse::failure(e.to_string()))
            }
        }
    }

    pub async fn call(
        &self,
        function_name: &str,
        link: &str,
        api_key: &str,
        optional_argument: Option<&str>,
    ) -> Result<Value, DispatchError> {
        let overrides = parse_optional_args(optional_argument)?;
        let function: ScrapeGraphFunction = function_name.parse()?;
        let endpoint = self
            .base_url
            .join(function.endpoint())
            .map_err(|e| DispatchError::Request(e.to_string()))?;
        let payload = function.build_payload(link, &overrides);

        tracing::debug!(%endpoint, payload = %pretty(&payload), "sending request");

        let response = self
            .client
            .post(endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DispatchError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| DispatchError::Decode(e.to_string()))
    }
}

fn classify_request_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Request(format!("TimeoutError: {}", e))
    } else if e.is_connect() {
        DispatchError::Request(format!("ConnectError: {}", e))
    } else {
        DispatchError::Request(format!("RequestError: {}", e))
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }).to_string())
}
