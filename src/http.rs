//! Streaming HTTP transport for the synthesis protocol.
//!
//! One synthesis call is one POST: the request carries the voice, text and
//! desired format as JSON, the response body is the raw PCM stream delivered
//! in chunks. A non-success status maps onto the error taxonomy before any
//! audio is consumed.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::error::Error;
use crate::transport::{
    AudioChunk, StreamEvent, SynthesisRequest, SynthesisStream, SynthesisTransport,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Streaming HTTP implementation of [`SynthesisTransport`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with its own connection pool.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisTransport for HttpTransport {
    async fn synthesize(
        &self,
        config: &SynthesisConfig,
        request: &SynthesisRequest,
    ) -> Result<Box<dyn SynthesisStream>, Error> {
        info!(endpoint = %config.endpoint(), voice = %config.voice(), "posting synthesis request");

        let body = json!({
            "voice": config.voice(),
            "text": request.text,
            "output_format": request.format.wire_name(),
        });

        // The timeout covers the whole exchange, matching the transport's
        // one-call-one-attempt contract.
        let response = self
            .client
            .post(config.endpoint())
            .bearer_auth(config.credential())
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(map_status(status, message));
        }

        Ok(Box::new(HttpSynthesisStream {
            body: response.bytes_stream().boxed(),
            next_sequence: 0,
            done: false,
        }))
    }
}

struct HttpSynthesisStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    next_sequence: u32,
    done: bool,
}

#[async_trait]
impl SynthesisStream for HttpSynthesisStream {
    async fn next_event(&mut self) -> Result<StreamEvent, Error> {
        if self.done {
            return Err(Error::State("stream already ended".to_string()));
        }

        match self.body.next().await {
            Some(Ok(bytes)) => {
                debug!(len = bytes.len(), "audio chunk received");
                let chunk = AudioChunk {
                    data: bytes.to_vec(),
                    sequence: self.next_sequence,
                };
                self.next_sequence += 1;
                Ok(StreamEvent::Audio(chunk))
            }
            Some(Err(e)) => Err(Error::Network(e.to_string())),
            // An HTTP body ends cleanly only when the server finished the
            // response, which is the terminal success marker here.
            None => {
                info!(chunks = self.next_sequence, "synthesis stream complete");
                self.done = true;
                Ok(StreamEvent::End)
            }
        }
    }
}

fn map_status(status: StatusCode, message: String) -> Error {
    let message = if message.is_empty() {
        format!("status {}", status)
    } else {
        message
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => Error::Quota(message),
        s if s.is_client_error() => Error::Synthesis(message),
        _ => Error::Network(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, String::new()),
            Error::Auth(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            Error::Quota(_)
        ));
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "bad voice".to_string()),
            Error::Synthesis(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, String::new()),
            Error::Network(_)
        ));
    }
}
