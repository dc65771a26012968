use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::models::{InboundPayload, InboundRequest, InvokeArgs, ResponseEnvelope, Secrets};

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Payload(#[from] serde_json::Error),
}

/// Entry point shared by the Lambda runtime and the local HTTP surface.
///
/// Dispatcher failures still produce a 200 envelope carrying a
/// `success: false` body; only an unreadable event yields a 500.
pub async fn handle(dispatcher: &Dispatcher, event: InboundRequest) -> ResponseEnvelope {
    match invoke(dispatcher, &event).await {
        Ok(result) => ResponseEnvelope {
            status_code: 200,
            body: encode_string(&result),
        },
        Err(e) => {
            let message = match e.to_string() {
                m if m.is_empty() => UNKNOWN_ERROR.to_string(),
                m => m,
            };
            tracing::warn!(error = %message, "rejecting inbound event");
            ResponseEnvelope {
                status_code: 500,
                body: encode_string(&message),
            }
        }
    }
}

async fn invoke(dispatcher: &Dispatcher, event: &InboundRequest) -> Result<String, HandlerError> {
    let InboundPayload {
        args:
            InvokeArgs {
                scrapegraph_function,
                link,
                optional_argument,
            },
        secrets: Secrets { sgai_api_key },
    } = serde_json::from_str(&event.body)?;

    Ok(dispatcher
        .dispatch(
            &scrapegraph_function,
            &link,
            &sgai_api_key,
            optional_argument.as_deref(),
        )
        .await)
}

// The dispatcher output is already JSON; the envelope carries it as a JSON
// string literal.
fn encode_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(base_url: &str) -> Dispatcher {
        Dispatcher::new(&Config::with_base_url(base_url).unwrap()).unwrap()
    }

    fn event(payload: Value) -> InboundRequest {
        InboundRequest {
            body: payload.to_string(),
        }
    }

    fn decode_body(envelope: &ResponseEnvelope) -> String {
        serde_json::from_str::<String>(&envelope.body).unwrap()
    }

    #[tokio::test]
    async fn malformed_body_is_a_500() {
        let envelope = handle(
            &dispatcher("http://127.0.0.1:1/v1"),
            InboundRequest {
                body: "{not json".to_string(),
            },
        )
        .await;

        assert_eq!(envelope.status_code, 500);
        assert!(!decode_body(&envelope).is_empty());
    }

    #[tokio::test]
    async fn missing_secret_is_a_500() {
        let envelope = handle(
            &dispatcher("http://127.0.0.1:1/v1"),
            event(json!({
                "args": { "scrapegraph_function": "markdownify", "link": "https://example.com" },
                "secrets": {}
            })),
        )
        .await;

        assert_eq!(envelope.status_code, 500);
        assert!(decode_body(&envelope).contains("SGAI_API_KEY"));
    }

    #[tokio::test]
    async fn dispatcher_failure_is_still_a_200() {
        let envelope = handle(
            &dispatcher("http://127.0.0.1:1/v1"),
            event(json!({
                "args": { "scrapegraph_function": "translate", "link": "https://example.com" },
                "secrets": { "SGAI_API_KEY": "key" }
            })),
        )
        .await;

        assert_eq!(envelope.status_code, 200);
        let inner: Value = serde_json::from_str(&decode_body(&envelope)).unwrap();
        assert_eq!(
            inner,
            json!({ "success": false, "error": "Unknown ScrapeGraphAI function: translate" })
        );
    }

    #[tokio::test]
    async fn success_body_is_double_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/searchscraper"))
            .and(header("sgai-apikey", "sgai-live"))
            .and(body_json(json!({
                "user_prompt": "latest rust release",
                "num_results": 5,
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "result": { "version": "1.90" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let envelope = handle(
            &dispatcher(&format!("{}/v1", server.uri())),
            event(json!({
                "args": {
                    "scrapegraph_function": "SearchScraper",
                    "link": "https://ignored.example",
                    "optional_argument": r#"{"user_prompt": "latest rust release", "num_results": 5}"#
                },
                "secrets": { "SGAI_API_KEY": "sgai-live" }
            })),
        )
        .await;

        assert_eq!(envelope.status_code, 200);
        assert!(envelope.body.starts_with('"'));
        let inner = decode_body(&envelope);
        assert_eq!(
            inner,
            serde_json::to_string_pretty(&json!({ "result": { "version": "1.90" } })).unwrap()
        );
    }

    #[test]
    fn envelope_uses_camel_case_status() {
        let envelope = ResponseEnvelope {
            status_code: 500,
            body: encode_string("boom"),
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "statusCode": 500, "body": "\"boom\"" })
        );
    }
}
