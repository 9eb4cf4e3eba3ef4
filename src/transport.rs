//! Transport abstraction over the remote synthesis service.

use async_trait::async_trait;

use crate::config::{AudioFormat, SynthesisConfig};
use crate::error::Error;

/// A single synthesis request, created per call and discarded after use.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to synthesize.
    pub text: String,
    /// Desired PCM output format.
    pub format: AudioFormat,
}

/// One unit of streamed audio, tagged with its position in the stream.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw PCM bytes.
    pub data: Vec<u8>,
    /// Zero-based position of this chunk in the stream.
    pub sequence: u32,
}

/// Events pulled from a [`SynthesisStream`].
#[derive(Debug)]
pub enum StreamEvent {
    /// The next audio chunk.
    Audio(AudioChunk),
    /// Terminal success marker. No further events follow.
    End,
}

/// A finite stream of synthesized audio for one request.
///
/// Not restartable: once an error or [`StreamEvent::End`] is returned, a new
/// call through the transport is required to synthesize again.
#[async_trait]
pub trait SynthesisStream: Send {
    /// Suspends until the next chunk or terminal event is available.
    async fn next_event(&mut self) -> Result<StreamEvent, Error>;
}

/// Capability interface for the remote synthesis call.
///
/// Implementations decide the wire mechanism: [`WsTransport`] speaks the
/// WebSocket protocol, [`HttpTransport`] a streaming POST, and tests plug in
/// scripted doubles.
///
/// [`WsTransport`]: crate::WsTransport
/// [`HttpTransport`]: crate::HttpTransport
#[async_trait]
pub trait SynthesisTransport: Send + Sync {
    /// Opens one synthesis call and returns its chunk stream.
    async fn synthesize(
        &self,
        config: &SynthesisConfig,
        request: &SynthesisRequest,
    ) -> Result<Box<dyn SynthesisStream>, Error>;
}
