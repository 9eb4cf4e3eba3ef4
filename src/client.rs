//! Top-level synthesis orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{AudioFormat, SynthesisConfig};
use crate::error::Error;
use crate::sink::AudioSink;
use crate::transport::{StreamEvent, SynthesisRequest, SynthesisTransport};

/// Metadata describing a completed synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// Path of the finished WAV file.
    pub path: PathBuf,
    /// Payload bytes written, excluding the 44-byte header.
    pub data_len: u64,
    /// Playback duration derived from the payload length and format.
    pub duration: Duration,
}

/// Client that turns text into WAV files via a remote synthesis service.
///
/// The configuration is immutable for the client's lifetime. Concurrent
/// [`synthesize`](SynthesisClient::synthesize) calls against different output
/// paths are safe; every call gets its own sink and transport stream.
///
/// Each call makes exactly one attempt and produces at most one file; retry
/// policy belongs to the caller. Cancelling a call by dropping its future
/// cleans up the partial output the same way a network failure does.
pub struct SynthesisClient {
    config: SynthesisConfig,
    transport: Arc<dyn SynthesisTransport>,
    format: AudioFormat,
}

impl SynthesisClient {
    /// Creates a new client over the given transport.
    ///
    /// The output format defaults to 24 kHz, 16-bit mono PCM; override it
    /// with [`with_format`](SynthesisClient::with_format).
    pub fn new(config: SynthesisConfig, transport: Arc<dyn SynthesisTransport>) -> Self {
        Self {
            config,
            transport,
            format: AudioFormat::Pcm24Khz16BitMono,
        }
    }

    /// Sets the PCM output format requested from the service.
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// The client's configuration.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesizes `text` into a WAV file at `output_path`.
    ///
    /// On any failure the partial output file is removed before the error is
    /// returned, so the path never holds a truncated WAV posing as complete.
    pub async fn synthesize(
        &self,
        text: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<SynthesisOutput, Error> {
        if text.trim().is_empty() {
            return Err(Error::Config("text must not be empty".to_string()));
        }

        let session_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let request = SynthesisRequest {
            text: text.to_string(),
            format: self.format,
        };

        info!(
            session_id = %session_id,
            voice = %self.config.voice(),
            chars = text.len(),
            "synthesis starting"
        );

        let mut sink = AudioSink::create(&output_path).await?;
        match self.run_stream(&request, &mut sink).await {
            Ok(()) => {
                let data_len = sink.finalize(self.format).await?;
                let duration =
                    Duration::from_secs_f64(data_len as f64 / self.format.byte_rate() as f64);
                info!(
                    session_id = %session_id,
                    data_len,
                    duration_ms = duration.as_millis() as u64,
                    "synthesis complete"
                );
                Ok(SynthesisOutput {
                    path: output_path.as_ref().to_path_buf(),
                    data_len,
                    duration,
                })
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "synthesis failed, discarding partial output");
                sink.abort();
                Err(e)
            }
        }
    }

    async fn run_stream(
        &self,
        request: &SynthesisRequest,
        sink: &mut AudioSink,
    ) -> Result<(), Error> {
        let mut stream = self.transport.synthesize(&self.config, request).await?;
        loop {
            match stream.next_event().await? {
                StreamEvent::Audio(chunk) => sink.write_chunk(&chunk).await?,
                StreamEvent::End => return Ok(()),
            }
        }
    }
}
