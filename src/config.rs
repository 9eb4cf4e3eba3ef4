//! Synthesis configuration and audio output formats.

use crate::error::Error;

/// PCM output formats supported by the client.
///
/// All formats are 16-bit mono; the remote service picks the sample stream to
/// match whichever format the request declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// 16 kHz, 16-bit, mono PCM.
    Pcm16Khz16BitMono,
    /// 24 kHz, 16-bit, mono PCM.
    Pcm24Khz16BitMono,
    /// 48 kHz, 16-bit, mono PCM.
    Pcm48Khz16BitMono,
}

impl AudioFormat {
    /// Samples per second.
    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioFormat::Pcm16Khz16BitMono => 16_000,
            AudioFormat::Pcm24Khz16BitMono => 24_000,
            AudioFormat::Pcm48Khz16BitMono => 48_000,
        }
    }

    /// Bits per sample.
    pub fn bits_per_sample(&self) -> u16 {
        16
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        1
    }

    /// Bytes of audio per second of playback.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate() * self.channels() as u32 * (self.bits_per_sample() as u32 / 8)
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels() * (self.bits_per_sample() / 8)
    }

    /// Format name used on the wire when requesting synthesis.
    pub fn wire_name(&self) -> &'static str {
        match self {
            AudioFormat::Pcm16Khz16BitMono => "pcm_16000",
            AudioFormat::Pcm24Khz16BitMono => "pcm_24000",
            AudioFormat::Pcm48Khz16BitMono => "pcm_48000",
        }
    }
}

/// Immutable configuration for a synthesis client.
///
/// Constructed once, owned by the client for its lifetime. All fields are
/// validated as non-empty at construction.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    endpoint: String,
    credential: String,
    voice: String,
}

impl SynthesisConfig {
    /// Creates a new configuration.
    ///
    /// Returns [`Error::Config`] if any field is empty.
    pub fn new(
        endpoint: impl Into<String>,
        credential: impl Into<String>,
        voice: impl Into<String>,
    ) -> Result<Self, Error> {
        let endpoint = endpoint.into();
        let credential = credential.into();
        let voice = voice.into();

        if endpoint.is_empty() {
            return Err(Error::Config("endpoint must not be empty".to_string()));
        }
        if credential.is_empty() {
            return Err(Error::Config("credential must not be empty".to_string()));
        }
        if voice.is_empty() {
            return Err(Error::Config("voice name must not be empty".to_string()));
        }

        Ok(Self {
            endpoint,
            credential,
            voice,
        })
    }

    /// Service endpoint URI.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Opaque credential presented to the service.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Voice name used for synthesis.
    pub fn voice(&self) -> &str {
        &self.voice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_valid() {
        let config = SynthesisConfig::new("wss://host/tts", "key", "voice-1").unwrap();
        assert_eq!(config.endpoint(), "wss://host/tts");
        assert_eq!(config.credential(), "key");
        assert_eq!(config.voice(), "voice-1");
    }

    #[test]
    fn test_config_rejects_empty_fields() {
        assert!(matches!(
            SynthesisConfig::new("", "key", "voice"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SynthesisConfig::new("wss://host", "", "voice"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SynthesisConfig::new("wss://host", "key", ""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_format_parameters() {
        let format = AudioFormat::Pcm16Khz16BitMono;
        assert_eq!(format.sample_rate(), 16_000);
        assert_eq!(format.channels(), 1);
        assert_eq!(format.bits_per_sample(), 16);
        assert_eq!(format.byte_rate(), 32_000);
        assert_eq!(format.block_align(), 2);
        assert_eq!(format.wire_name(), "pcm_16000");

        assert_eq!(AudioFormat::Pcm48Khz16BitMono.byte_rate(), 96_000);
    }
}
