//! Fakes for the network seams, shared by the unit tests.

use crate::api_service::{HttpResponse, RequestOptions, Sleeper, Transport, TransportError};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

pub fn respond(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

pub fn offline() -> Result<HttpResponse, TransportError> {
    Err(TransportError::new("connection refused"))
}

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub url: String,
    pub options: RequestOptions,
}

/// Replays canned responses in order and remembers what was sent. Once the
/// script runs out every further call fails like a dead network.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl IntoIterator<Item = Result<HttpResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            script: Mutex::new(script.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            options: options.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(offline)
    }
}

/// Records each requested wait and returns at once.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingSleeper::default())
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
