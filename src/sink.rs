//! File-backed sink for streamed PCM audio.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::AudioFormat;
use crate::error::Error;
use crate::transport::AudioChunk;
use crate::wav::{WavHeader, HEADER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Streaming,
    Finalized,
    Aborted,
}

/// Writes an ordered chunk stream to a WAV file.
///
/// A 44-byte placeholder is written at creation so audio appends sequentially
/// behind the header slot; [`AudioSink::finalize`] seeks back and patches in
/// the real header once the payload length is known.
///
/// A sink that is dropped before finalizing removes its partial file, so an
/// aborted or cancelled synthesis never leaves a valid-looking WAV behind.
pub struct AudioSink {
    file: Option<File>,
    path: PathBuf,
    next_sequence: u32,
    bytes_written: u64,
    state: SinkState,
}

impl AudioSink {
    /// Creates the output file and reserves the header slot.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path).await?;
        file.write_all(&[0u8; HEADER_LEN]).await?;

        debug!(path = %path.display(), "audio sink opened");

        Ok(Self {
            file: Some(file),
            path,
            next_sequence: 0,
            bytes_written: 0,
            state: SinkState::Streaming,
        })
    }

    /// Appends one chunk to the payload.
    ///
    /// Chunks must arrive in sequence order. A gap or repeat is
    /// [`Error::Protocol`] and the sink accepts no further writes; audio is
    /// ordering-sensitive, so reordering on behalf of the transport would
    /// mask a transport bug.
    pub async fn write_chunk(&mut self, chunk: &AudioChunk) -> Result<(), Error> {
        if self.state != SinkState::Streaming {
            return Err(Error::State("write after finalize or abort".to_string()));
        }
        if chunk.sequence != self.next_sequence {
            self.discard();
            return Err(Error::Protocol(format!(
                "chunk {} received, expected {}",
                chunk.sequence, self.next_sequence
            )));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::State("sink file is closed".to_string()))?;
        file.write_all(&chunk.data).await?;

        self.next_sequence += 1;
        self.bytes_written += chunk.data.len() as u64;
        debug!(
            sequence = chunk.sequence,
            len = chunk.data.len(),
            "audio chunk written"
        );
        Ok(())
    }

    /// Patches the real header over the placeholder and flushes the file.
    ///
    /// Returns the payload byte count. Calling this a second time, or after
    /// an abort, is [`Error::State`].
    pub async fn finalize(&mut self, format: AudioFormat) -> Result<u64, Error> {
        match self.state {
            SinkState::Finalized => {
                return Err(Error::State("sink already finalized".to_string()));
            }
            SinkState::Aborted => {
                return Err(Error::State("sink was aborted".to_string()));
            }
            SinkState::Streaming => {}
        }

        let data_len = u32::try_from(self.bytes_written)
            .map_err(|_| Error::Protocol("payload exceeds WAV size limit".to_string()))?;

        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::State("sink file is closed".to_string()))?;
        let header = WavHeader::for_format(format, data_len);
        file.seek(SeekFrom::Start(0)).await?;
        file.write_all(&header.encode()).await?;
        file.flush().await?;
        file.sync_all().await?;

        self.state = SinkState::Finalized;
        debug!(path = %self.path.display(), data_len, "audio sink finalized");
        Ok(self.bytes_written)
    }

    /// Closes the sink and removes the partial file.
    pub fn abort(mut self) {
        self.discard();
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn discard(&mut self) {
        if self.state != SinkState::Streaming {
            return;
        }
        self.state = SinkState::Aborted;
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove partial output");
        } else {
            debug!(path = %self.path.display(), "partial output removed");
        }
    }
}

impl Drop for AudioSink {
    fn drop(&mut self) {
        // Covers error paths and cancelled tasks alike.
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ttswav-sink-{}-{}.wav", tag, uuid::Uuid::new_v4()))
    }

    fn chunk(sequence: u32, data: &[u8]) -> AudioChunk {
        AudioChunk {
            data: data.to_vec(),
            sequence,
        }
    }

    #[tokio::test]
    async fn test_write_and_finalize() {
        let path = temp_path("ok");
        let mut sink = AudioSink::create(&path).await.unwrap();

        sink.write_chunk(&chunk(0, &[1, 2, 3, 4])).await.unwrap();
        sink.write_chunk(&chunk(1, &[5, 6])).await.unwrap();
        let written = sink.finalize(AudioFormat::Pcm16Khz16BitMono).await.unwrap();
        assert_eq!(written, 6);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 6);
        assert_eq!(&bytes[HEADER_LEN..], &[1, 2, 3, 4, 5, 6]);

        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.sample_rate, 16_000);
        assert_eq!(header.data_len, 6);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_double_finalize_is_state_error() {
        let path = temp_path("double");
        let mut sink = AudioSink::create(&path).await.unwrap();
        sink.write_chunk(&chunk(0, &[0, 0])).await.unwrap();
        sink.finalize(AudioFormat::Pcm24Khz16BitMono).await.unwrap();

        let result = sink.finalize(AudioFormat::Pcm24Khz16BitMono).await;
        assert!(matches!(result, Err(Error::State(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_out_of_order_chunk_is_protocol_error() {
        let path = temp_path("order");
        let mut sink = AudioSink::create(&path).await.unwrap();
        sink.write_chunk(&chunk(0, &[1])).await.unwrap();

        let result = sink.write_chunk(&chunk(2, &[2])).await;
        assert!(matches!(result, Err(Error::Protocol(_))));

        // The sink discarded itself; further writes are refused and the
        // partial file is gone.
        let result = sink.write_chunk(&chunk(1, &[3])).await;
        assert!(matches!(result, Err(Error::State(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_partial_file() {
        let path = temp_path("drop");
        {
            let mut sink = AudioSink::create(&path).await.unwrap();
            sink.write_chunk(&chunk(0, &[9, 9, 9])).await.unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_abort_removes_file() {
        let path = temp_path("abort");
        let sink = AudioSink::create(&path).await.unwrap();
        sink.abort();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_finalized_file_survives_drop() {
        let path = temp_path("keep");
        {
            let mut sink = AudioSink::create(&path).await.unwrap();
            sink.write_chunk(&chunk(0, &[1, 2])).await.unwrap();
            sink.finalize(AudioFormat::Pcm48Khz16BitMono).await.unwrap();
        }
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }
}
