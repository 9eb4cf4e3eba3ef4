//! RIFF/WAVE container header encoding and parsing.

use crate::config::AudioFormat;
use crate::error::Error;

/// Length of the canonical RIFF/WAVE header in bytes.
pub const HEADER_LEN: usize = 44;

/// PCM format tag in the fmt chunk.
const FORMAT_PCM: u16 = 1;

/// Format parameters of a WAV file, encodable to and parseable from the
/// canonical 44-byte header.
///
/// Supports both usage modes of a streaming writer: encode up front when the
/// payload length is known, or encode with the final length after streaming
/// completes and patch it over a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub data_len: u32,
}

impl WavHeader {
    /// Creates a header description, validating the format parameters.
    ///
    /// Returns [`Error::Config`] for a zero sample rate, zero channels, or a
    /// bit depth other than 8, 16, 24 or 32.
    pub fn new(
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
        data_len: u32,
    ) -> Result<Self, Error> {
        if sample_rate == 0 {
            return Err(Error::Config("sample rate must not be zero".to_string()));
        }
        if channels == 0 {
            return Err(Error::Config("channel count must not be zero".to_string()));
        }
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::Config(format!(
                "unsupported bits per sample: {}",
                bits_per_sample
            )));
        }
        Ok(Self {
            sample_rate,
            bits_per_sample,
            channels,
            data_len,
        })
    }

    /// Creates a header for one of the client's output formats.
    pub fn for_format(format: AudioFormat, data_len: u32) -> Self {
        Self {
            sample_rate: format.sample_rate(),
            bits_per_sample: format.bits_per_sample(),
            channels: format.channels(),
            data_len,
        }
    }

    /// Bytes of audio per second of playback.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Encodes the canonical 44-byte header.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];

        // RIFF chunk
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&(36 + self.data_len).to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");

        // fmt chunk
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&16u32.to_le_bytes());
        out[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        // data chunk
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_len.to_le_bytes());

        out
    }

    /// Parses a canonical header back out of encoded bytes.
    ///
    /// Returns [`Error::Protocol`] if the bytes are not a valid PCM WAV
    /// header.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Protocol(format!(
                "WAV header truncated: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(Error::Protocol("not a RIFF/WAVE header".to_string()));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(Error::Protocol("unexpected WAV chunk layout".to_string()));
        }

        let format_tag = u16::from_le_bytes([bytes[20], bytes[21]]);
        if format_tag != FORMAT_PCM {
            return Err(Error::Protocol(format!(
                "unsupported WAV format tag: {}",
                format_tag
            )));
        }

        let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
        let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        let bits_per_sample = u16::from_le_bytes([bytes[34], bytes[35]]);
        let data_len = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);

        Self::new(sample_rate, bits_per_sample, channels, data_len)
            .map_err(|e| Error::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parse_round_trip() {
        for &sample_rate in &[8_000u32, 16_000, 24_000, 44_100, 48_000] {
            for &bits in &[8u16, 16, 24, 32] {
                for &channels in &[1u16, 2] {
                    let header = WavHeader::new(sample_rate, bits, channels, 9_600).unwrap();
                    let parsed = WavHeader::parse(&header.encode()).unwrap();
                    assert_eq!(parsed, header);
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            WavHeader::new(0, 16, 1, 0),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WavHeader::new(16_000, 16, 0, 0),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WavHeader::new(16_000, 12, 1, 0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_known_header_fields() {
        let header = WavHeader::for_format(AudioFormat::Pcm16Khz16BitMono, 9_600);
        let bytes = header.encode();

        assert_eq!(&bytes[0..4], b"RIFF");
        // RIFF size is payload + 36 bytes of header after the size field.
        assert_eq!(
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            9_636
        );
        assert_eq!(header.byte_rate(), 32_000);
        assert_eq!(header.block_align(), 2);
        assert_eq!(
            u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
            9_600
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            WavHeader::parse(&[0u8; 10]),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            WavHeader::parse(&[0u8; HEADER_LEN]),
            Err(Error::Protocol(_))
        ));

        // Non-PCM format tag.
        let mut bytes = WavHeader::for_format(AudioFormat::Pcm24Khz16BitMono, 0).encode();
        bytes[20] = 3;
        assert!(matches!(WavHeader::parse(&bytes), Err(Error::Protocol(_))));
    }
}
