//! Async client library for remote text-to-speech services.
//!
//! Submits text to a synthesis service over WebSocket or streaming HTTP,
//! receives the synthesized audio as an ordered chunk stream, and writes it
//! to a canonical RIFF/WAVE file on disk.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ttswav::{AudioFormat, SynthesisClient, SynthesisConfig, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ttswav::Error> {
//!     let config = SynthesisConfig::new(
//!         "wss://speech.example.com/api/tts",
//!         std::env::var("TTS_API_KEY").expect("TTS_API_KEY not set"),
//!         ttswav::DEFAULT_VOICE,
//!     )?;
//!
//!     let client = SynthesisClient::new(config, Arc::new(WsTransport::new()))
//!         .with_format(AudioFormat::Pcm24Khz16BitMono);
//!
//!     let output = client.synthesize("Hello, world!", "hello.wav").await?;
//!     println!(
//!         "wrote {} bytes ({:?}) to {}",
//!         output.data_len,
//!         output.duration,
//!         output.path.display()
//!     );
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod http;
mod messages;
mod sink;
mod transport;
mod wav;
mod ws;

pub use client::{SynthesisClient, SynthesisOutput};
pub use config::{AudioFormat, SynthesisConfig};
pub use error::Error;
pub use http::HttpTransport;
pub use sink::AudioSink;
pub use transport::{
    AudioChunk, StreamEvent, SynthesisRequest, SynthesisStream, SynthesisTransport,
};
pub use wav::{WavHeader, HEADER_LEN};
pub use ws::WsTransport;

/// Default voice name used when the caller has no preference.
pub const DEFAULT_VOICE: &str = "zh-CN-XiaomoNeural";
