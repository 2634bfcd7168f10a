//! Resilient fetch: every network call in the app goes through
//! [`ResilientFetch::request`], which retries failed attempts with
//! exponential backoff before giving up with a single generic error.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Retries after the first attempt, so a call makes at most `MAX_RETRIES + 1` tries.
pub const MAX_RETRIES: u32 = 3;

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed.")]
    NetworkRequestFailed,

    #[error("unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

/// Why a single attempt failed. Never leaves this module.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP error! Status: {0}")]
    Status(u16),

    #[error("invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn method(method: Method) -> Self {
        RequestOptions {
            method,
            ..RequestOptions::default()
        }
    }

    /// Options for a write carrying `payload` serialized as JSON.
    pub fn json<T: Serialize>(method: Method, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(RequestOptions {
            method,
            headers: vec![("Content-type".to_string(), JSON_CONTENT_TYPE.to_string())],
            body: Some(serde_json::to_string(payload)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn has_no_content(&self) -> bool {
        self.status == 204 || self.body.trim().is_empty()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, options: &RequestOptions)
        -> Result<HttpResponse, TransportError>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.request(options.method.into(), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Backoff before retry number `attempt + 1`: 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

#[derive(Clone)]
pub struct ResilientFetch {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientFetch {
    pub fn new(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>) -> Self {
        ResilientFetch { transport, sleeper }
    }

    /// Production wiring: reqwest over the network, tokio for the backoff.
    pub fn over_http() -> Result<Self, TransportError> {
        Ok(ResilientFetch::new(
            Arc::new(ReqwestTransport::new()?),
            Arc::new(TokioSleeper),
        ))
    }

    pub async fn request(&self, url: &str, options: &RequestOptions) -> Result<Value, FetchError> {
        self.request_from(url, options, 0).await
    }

    /// Like [`request`](Self::request), but `attempt` prior tries are already
    /// counted against the retry budget.
    pub async fn request_from(
        &self,
        url: &str,
        options: &RequestOptions,
        mut attempt: u32,
    ) -> Result<Value, FetchError> {
        loop {
            match self.attempt(url, options).await {
                Ok(value) => {
                    debug!(url, attempt, "request succeeded");
                    return Ok(value);
                }
                Err(err) if attempt < MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        url,
                        error = %err,
                        "Failed to fetch {} after {} retries",
                        url,
                        MAX_RETRIES
                    );
                    return Err(FetchError::NetworkRequestFailed);
                }
            }
        }
    }

    /// Issues the request and decodes the payload into `T`. A payload that
    /// does not match `T` is not retried.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T, FetchError> {
        let value = self.request(url, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn attempt(&self, url: &str, options: &RequestOptions) -> Result<Value, AttemptError> {
        let response = self.transport.send(url, options).await?;
        if !response.is_success() {
            return Err(AttemptError::Status(response.status));
        }
        if options.method == Method::Delete || response.has_no_content() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{offline, respond, RecordingSleeper, ScriptedTransport};
    use serde_json::json;

    fn fetch_with(
        transport: &Arc<ScriptedTransport>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> ResilientFetch {
        ResilientFetch::new(transport.clone(), sleeper.clone())
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn recovers_on_third_attempt_after_two_waits() {
        let transport = ScriptedTransport::new([
            offline(),
            respond(503, "unavailable"),
            respond(200, r#"{"id": 1, "title": "t"}"#),
        ]);
        let sleeper = RecordingSleeper::new();

        let value = fetch_with(&transport, &sleeper)
            .request("http://journal.test/posts/1", &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(value, json!({"id": 1, "title": "t"}));
        assert_eq!(transport.calls(), 3);
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let transport = ScriptedTransport::new([
            offline(),
            respond(500, ""),
            respond(502, ""),
            offline(),
            respond(200, "{}"),
        ]);
        let sleeper = RecordingSleeper::new();

        let err = fetch_with(&transport, &sleeper)
            .request("http://journal.test/posts", &RequestOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NetworkRequestFailed));
        assert_eq!(err.to_string(), "Network request failed.");
        assert_eq!(transport.calls(), (MAX_RETRIES + 1) as usize);
        assert_eq!(
            sleeper.slept(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_retried() {
        let transport = ScriptedTransport::new([respond(200, "<html>"), respond(200, "[1, 2]")]);
        let sleeper = RecordingSleeper::new();

        let value = fetch_with(&transport, &sleeper)
            .request("http://journal.test/posts", &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(value, json!([1, 2]));
        assert_eq!(sleeper.slept(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn delete_never_parses_the_body() {
        let transport = ScriptedTransport::new([respond(200, "definitely not json")]);
        let sleeper = RecordingSleeper::new();

        let value = fetch_with(&transport, &sleeper)
            .request(
                "http://journal.test/posts/7",
                &RequestOptions::method(Method::Delete),
            )
            .await
            .unwrap();

        assert_eq!(value, json!({}));
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn no_content_yields_empty_object() {
        let transport = ScriptedTransport::new([respond(204, ""), respond(200, "  ")]);
        let sleeper = RecordingSleeper::new();
        let fetch = fetch_with(&transport, &sleeper);

        for _ in 0..2 {
            let value = fetch
                .request("http://journal.test/posts", &RequestOptions::default())
                .await
                .unwrap();
            assert_eq!(value, json!({}));
        }
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_status_is_still_retried() {
        let transport = ScriptedTransport::new([respond(404, ""), respond(200, "")]);
        let sleeper = RecordingSleeper::new();

        fetch_with(&transport, &sleeper)
            .request(
                "http://journal.test/posts/7",
                &RequestOptions::method(Method::Delete),
            )
            .await
            .unwrap();

        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_budget_means_a_single_attempt() {
        let transport = ScriptedTransport::new([offline(), respond(200, "{}")]);
        let sleeper = RecordingSleeper::new();

        let result = fetch_with(&transport, &sleeper)
            .request_from(
                "http://journal.test/posts",
                &RequestOptions::default(),
                MAX_RETRIES,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn forwards_method_headers_and_body() {
        let transport = ScriptedTransport::new([respond(201, r#"{"ok": true}"#)]);
        let sleeper = RecordingSleeper::new();
        let options = RequestOptions::json(Method::Post, &json!({"title": "A"})).unwrap();

        fetch_with(&transport, &sleeper)
            .request("http://journal.test/posts", &options)
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://journal.test/posts");
        assert_eq!(sent[0].options, options);
        assert_eq!(
            sent[0].options.headers,
            vec![("Content-type".to_string(), JSON_CONTENT_TYPE.to_string())]
        );
    }

    #[tokio::test]
    async fn request_json_reports_shape_mismatch_without_retrying() {
        let transport = ScriptedTransport::new([respond(200, r#"{"unexpected": true}"#)]);
        let sleeper = RecordingSleeper::new();

        let result: Result<Vec<u32>, _> = fetch_with(&transport, &sleeper)
            .request_json("http://journal.test/posts", &RequestOptions::default())
            .await;

        assert!(matches!(result, Err(FetchError::Payload(_))));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_suspends_for_the_full_backoff() {
        let transport = ScriptedTransport::new([offline(), offline(), offline(), offline()]);
        let fetch = ResilientFetch::new(transport.clone(), Arc::new(TokioSleeper));
        let started = tokio::time::Instant::now();

        let result = fetch
            .request("http://journal.test/posts", &RequestOptions::default())
            .await;

        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_secs(7));
    }
}
