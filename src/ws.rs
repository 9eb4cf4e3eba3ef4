//! WebSocket transport for the synthesis protocol.
//!
//! One synthesis call is one session: connect, send a setup message, wait
//! for the server's ready message, send the text followed by end_of_stream,
//! then pull audio messages until the server's own end_of_stream marker.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::http::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info};

use crate::config::SynthesisConfig;
use crate::error::Error;
use crate::messages::*;
use crate::transport::{
    AudioChunk, StreamEvent, SynthesisRequest, SynthesisStream, SynthesisTransport,
};

const CONN_TIMEOUT: Duration = Duration::from_secs(10);
const RECV_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket implementation of [`SynthesisTransport`].
#[derive(Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates a new WebSocket transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SynthesisTransport for WsTransport {
    async fn synthesize(
        &self,
        config: &SynthesisConfig,
        request: &SynthesisRequest,
    ) -> Result<Box<dyn SynthesisStream>, Error> {
        let mut conn = connect(config.endpoint(), config.credential()).await?;

        let setup = SetupMessage::new(
            config.voice().to_string(),
            request.format.wire_name().to_string(),
        );
        send_json(&mut conn, &setup).await?;

        // The server acknowledges the setup before accepting text.
        let request_id = wait_ready(&mut conn).await?;
        info!(request_id = %request_id, "synthesis session ready");

        send_json(&mut conn, &TextMessage::new(request.text.clone())).await?;
        send_json(&mut conn, &EosMessage::new()).await?;

        Ok(Box::new(WsSynthesisStream {
            conn,
            next_sequence: 0,
            done: false,
        }))
    }
}

struct WsSynthesisStream {
    conn: WsStream,
    next_sequence: u32,
    done: bool,
}

#[async_trait]
impl SynthesisStream for WsSynthesisStream {
    async fn next_event(&mut self) -> Result<StreamEvent, Error> {
        if self.done {
            return Err(Error::State("stream already ended".to_string()));
        }

        loop {
            let msg = recv(&mut self.conn).await?;

            let text = match msg {
                Message::Text(t) => t,
                // Raw binary frames carry undecorated PCM.
                Message::Binary(data) => {
                    let chunk = AudioChunk {
                        data,
                        sequence: self.next_sequence,
                    };
                    self.next_sequence += 1;
                    return Ok(StreamEvent::Audio(chunk));
                }
                Message::Ping(data) => {
                    self.conn.send(Message::Pong(data)).await?;
                    continue;
                }
                Message::Pong(_) | Message::Frame(_) => continue,
                Message::Close(frame) => {
                    debug!(frame = ?frame, "server closed connection");
                    return Err(Error::Network(
                        "connection closed before end of stream".to_string(),
                    ));
                }
            };

            let generic: GenericMessage = serde_json::from_str(&text)?;
            match generic.msg_type.as_str() {
                "audio" => {
                    let msg: AudioMessage = serde_json::from_str(&text)?;
                    let data = general_purpose::STANDARD.decode(&msg.audio).map_err(|e| {
                        Error::Protocol(format!("invalid base64 audio payload: {}", e))
                    })?;
                    debug!(len = data.len(), "audio chunk received");
                    let chunk = AudioChunk {
                        data,
                        sequence: self.next_sequence,
                    };
                    self.next_sequence += 1;
                    return Ok(StreamEvent::Audio(chunk));
                }
                "end_of_stream" => {
                    info!(chunks = self.next_sequence, "synthesis stream complete");
                    self.done = true;
                    let _ = self.conn.close(None).await;
                    return Ok(StreamEvent::End);
                }
                "text" => {
                    // Text echo from the server, informational only.
                    continue;
                }
                "error" => {
                    let msg: ErrorMessage = serde_json::from_str(&text)?;
                    error!(message = %msg.message, code = msg.code, "server error");
                    return Err(map_server_error(msg.code, msg.message));
                }
                other => {
                    return Err(Error::Protocol(format!("unknown message type: {}", other)));
                }
            }
        }
    }
}

/// Opens a connection to the given URL, presenting the credential as an
/// `x-api-key` header on the upgrade request.
async fn connect(url: &str, credential: &str) -> Result<WsStream, Error> {
    info!(url = %url, "connecting");

    let request = Request::builder()
        .uri(url)
        .header("x-api-key", credential)
        .header("Host", extract_host(url))
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header(
            "Sec-WebSocket-Key",
            tokio_tungstenite::tungstenite::handshake::client::generate_key(),
        )
        .body(())
        .map_err(|e| Error::Config(format!("invalid endpoint: {}", e)))?;

    let (conn, _) = timeout(CONN_TIMEOUT, tokio_tungstenite::connect_async(request))
        .await
        .map_err(|_| Error::Network("connection timeout".to_string()))?
        .map_err(map_connect_error)?;

    info!(url = %url, "connected");
    Ok(conn)
}

async fn send_json<T: Serialize>(conn: &mut WsStream, payload: &T) -> Result<(), Error> {
    let json = serde_json::to_string(payload)?;
    debug!(json = %json, "sending");
    conn.send(Message::Text(json)).await?;
    Ok(())
}

async fn recv(conn: &mut WsStream) -> Result<Message, Error> {
    match timeout(RECV_TIMEOUT, conn.next()).await {
        Ok(Some(Ok(msg))) => Ok(msg),
        Ok(Some(Err(e))) => Err(Error::Network(e.to_string())),
        Ok(None) => Err(Error::Network(
            "connection closed before end of stream".to_string(),
        )),
        Err(_) => Err(Error::Network("receive timeout".to_string())),
    }
}

/// Waits for the server's ready message after setup.
async fn wait_ready(conn: &mut WsStream) -> Result<String, Error> {
    loop {
        let msg = recv(conn).await?;
        let text = match msg {
            Message::Text(t) => t,
            Message::Ping(data) => {
                conn.send(Message::Pong(data)).await?;
                continue;
            }
            Message::Pong(_) | Message::Frame(_) => continue,
            Message::Close(_) => {
                return Err(Error::Network(
                    "connection closed during session setup".to_string(),
                ));
            }
            Message::Binary(_) => {
                return Err(Error::Protocol(
                    "audio received before session was ready".to_string(),
                ));
            }
        };

        let generic: GenericMessage = serde_json::from_str(&text)?;
        match generic.msg_type.as_str() {
            "ready" => {
                let msg: ReadyMessage = serde_json::from_str(&text)?;
                return Ok(msg.request_id);
            }
            "error" => {
                let msg: ErrorMessage = serde_json::from_str(&text)?;
                error!(message = %msg.message, code = msg.code, "setup rejected");
                return Err(map_server_error(msg.code, msg.message));
            }
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected message during setup: {}",
                    other
                )));
            }
        }
    }
}

/// Maps an HTTP-style error code from the server onto the error taxonomy.
fn map_server_error(code: i32, message: String) -> Error {
    match code {
        401 | 403 => Error::Auth(message),
        429 => Error::Quota(message),
        400..=499 => Error::Synthesis(message),
        _ => Error::Network(message),
    }
}

/// Maps a failed upgrade handshake, distinguishing credential rejections and
/// throttling from plain connectivity failures.
fn map_connect_error(e: tokio_tungstenite::tungstenite::Error) -> Error {
    use tokio_tungstenite::tungstenite::Error as WsError;

    match &e {
        WsError::Http(response) => {
            let code = response.status().as_u16() as i32;
            map_server_error(code, format!("handshake rejected with status {}", code))
        }
        _ => Error::Network(e.to_string()),
    }
}

fn extract_host(url: &str) -> &str {
    url.strip_prefix("wss://")
        .or_else(|| url.strip_prefix("ws://"))
        .and_then(|s| s.split('/').next())
        .unwrap_or("localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_server_error() {
        assert!(matches!(map_server_error(401, String::new()), Error::Auth(_)));
        assert!(matches!(map_server_error(403, String::new()), Error::Auth(_)));
        assert!(matches!(map_server_error(429, String::new()), Error::Quota(_)));
        assert!(matches!(
            map_server_error(400, String::new()),
            Error::Synthesis(_)
        ));
        assert!(matches!(
            map_server_error(500, String::new()),
            Error::Network(_)
        ));
    }

    #[test]
    fn test_extract_host() {
        assert_eq!(extract_host("wss://host.example.com/api/tts"), "host.example.com");
        assert_eq!(extract_host("ws://localhost:8080/tts"), "localhost:8080");
        assert_eq!(extract_host("nonsense"), "localhost");
    }
}
