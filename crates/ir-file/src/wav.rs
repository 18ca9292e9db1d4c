//! WAV impulse-response decoder
//!
//! Only what an IR loader needs: mono files, 16/24-bit PCM and 32-bit
//! float. Chunks other than `RIFF`, `WAVE`, `fmt ` and `data` are skipped
//! wherever a chunk header is expected, so files carrying `LIST`, `bext`,
//! `fact` or `JUNK` chunks load fine.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use ir_core::Tap;

use crate::{LoadError, LoadResult, RawAudio};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

const TAG_RIFF: [u8; 4] = *b"RIFF";
const TAG_WAVE: [u8; 4] = *b"WAVE";
const TAG_FMT: [u8; 4] = *b"fmt ";
const TAG_DATA: [u8; 4] = *b"data";

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FORMAT_ALAW: u16 = 6;
const FORMAT_MULAW: u16 = 7;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of a plain `WAVEFORMAT` + bits-per-sample
const MIN_FMT_SIZE: u32 = 16;

const SCALE_16: Tap = 1.0 / (1 << 15) as Tap;
const SCALE_24: Tap = 1.0 / (1 << 23) as Tap;

// ═══════════════════════════════════════════════════════════════════════════════
// FORMAT CHUNK
// ═══════════════════════════════════════════════════════════════════════════════

/// Sample encodings the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Signed 16-bit little-endian integer
    Pcm16,
    /// Signed 24-bit little-endian integer, packed in 3 bytes
    Pcm24,
    /// IEEE single-precision float (also used for 32-bit PCM)
    Float32,
}

impl SampleEncoding {
    /// Bytes per mono sample frame
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Pcm16 => 2,
            Self::Pcm24 => 3,
            Self::Float32 => 4,
        }
    }
}

/// Fields of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChunk {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    /// Informational
    pub byte_rate: u32,
    /// Informational
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    /// Pick the decoder for this (format, bit depth) combination.
    pub fn encoding(&self) -> LoadResult<SampleEncoding> {
        match (self.format_code, self.bits_per_sample) {
            (FORMAT_PCM, 16) => Ok(SampleEncoding::Pcm16),
            (FORMAT_PCM, 24) => Ok(SampleEncoding::Pcm24),
            (FORMAT_PCM, 32) | (FORMAT_IEEE_FLOAT, 32) => Ok(SampleEncoding::Float32),
            (code, bits) => {
                log::warn!("Unsupported bits per sample {} for format code {}", bits, code);
                Err(LoadError::UnsupportedBitsPerSample)
            }
        }
    }
}

/// Map a format code to an error unless it is PCM or IEEE float.
fn check_format_code(code: u16) -> LoadResult<()> {
    let result = match code {
        FORMAT_PCM | FORMAT_IEEE_FLOAT => Ok(()),
        FORMAT_ALAW => Err(LoadError::UnsupportedAlaw),
        FORMAT_MULAW => Err(LoadError::UnsupportedMulaw),
        FORMAT_EXTENSIBLE => Err(LoadError::UnsupportedExtensible),
        _ => Err(LoadError::InvalidFile),
    };
    result.inspect_err(|err| log::warn!("Unsupported WAV format code {}: {}", code, err))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHUNK READER
// ═══════════════════════════════════════════════════════════════════════════════

#[inline]
fn is_known_tag(tag: &[u8; 4]) -> bool {
    matches!(*tag, TAG_RIFF | TAG_WAVE | TAG_FMT | TAG_DATA)
}

/// Little-endian primitive reads over any byte stream
struct ChunkReader<R> {
    inner: R,
}

impl<R: Read> ChunkReader<R> {
    fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag)?;
        Ok(tag)
    }

    fn read_u16(&mut self) -> io::Result<u16> {
        let mut bytes = [0u8; 2];
        self.inner.read_exact(&mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        let mut bytes = [0u8; 4];
        self.inner.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Discard up to `count` bytes. Returns how many were actually skipped.
    fn skip(&mut self, count: u64) -> io::Result<u64> {
        io::copy(&mut (&mut self.inner).take(count), &mut io::sink())
    }

    /// Read the next recognized chunk tag, skipping unknown chunks.
    fn next_chunk(&mut self) -> LoadResult<[u8; 4]> {
        let mut tag = self.read_tag()?;
        while !is_known_tag(&tag) {
            let size = self.read_u32()?;
            log::debug!(
                "Skipping chunk {:?} ({} bytes)",
                String::from_utf8_lossy(&tag),
                size
            );
            // Chunks are word aligned: odd sizes carry one pad byte
            self.skip(u64::from(size) + u64::from(size & 1))?;
            tag = self.read_tag()?;
        }
        Ok(tag)
    }

    fn read_format_chunk(&mut self) -> LoadResult<FormatChunk> {
        let size = self.read_u32()?;
        if size < MIN_FMT_SIZE {
            log::warn!(
                "fmt chunk is {} bytes, smaller than the required {}",
                size,
                MIN_FMT_SIZE
            );
            return Err(LoadError::InvalidFile);
        }

        let format_code = self.read_u16()?;
        check_format_code(format_code)?;

        let channels = self.read_u16()?;
        if channels != 1 {
            log::warn!("IR must be mono, file has {} channels", channels);
            return Err(LoadError::NotMono);
        }

        let sample_rate = self.read_u32()?;
        let byte_rate = self.read_u32()?;
        let block_align = self.read_u16()?;
        let bits_per_sample = self.read_u16()?;

        // cbSize and extension fields carry nothing we use
        let extra = u64::from(size - MIN_FMT_SIZE);
        if extra > 0 && self.skip(extra)? < extra {
            return Err(LoadError::InvalidFile);
        }

        Ok(FormatChunk {
            format_code,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
        })
    }

    /// Read exactly `size` payload bytes.
    fn read_payload(&mut self, size: u32) -> LoadResult<Vec<u8>> {
        let mut payload = Vec::new();
        (&mut self.inner)
            .take(u64::from(size))
            .read_to_end(&mut payload)?;
        if payload.len() < size as usize {
            log::warn!(
                "data chunk truncated: declared {} bytes, found {}",
                size,
                payload.len()
            );
            return Err(LoadError::InvalidFile);
        }
        Ok(payload)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAMPLE DECODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Sign-extend a packed little-endian 24-bit integer.
#[inline]
pub fn read_i24(bytes: [u8; 3]) -> i32 {
    let mut value = i32::from(bytes[0]) | (i32::from(bytes[1]) << 8) | (i32::from(bytes[2]) << 16);
    if value & (1 << 23) != 0 {
        value |= !((1 << 24) - 1);
    }
    value
}

/// Decode a `data` payload. Trailing bytes that do not form a whole sample
/// are ignored.
pub fn decode_samples(payload: &[u8], encoding: SampleEncoding) -> Vec<Tap> {
    let chunks = payload.chunks_exact(encoding.bytes_per_sample());
    match encoding {
        SampleEncoding::Pcm16 => chunks
            .map(|b| Tap::from(i16::from_le_bytes([b[0], b[1]])) * SCALE_16)
            .collect(),
        SampleEncoding::Pcm24 => chunks
            .map(|b| read_i24([b[0], b[1], b[2]]) as Tap * SCALE_24)
            .collect(),
        SampleEncoding::Float32 => chunks
            .map(|b| Tap::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode a mono WAV impulse response from any byte stream.
pub fn decode<R: Read>(reader: R) -> LoadResult<RawAudio> {
    let mut reader = ChunkReader::new(reader);

    let tag = reader.next_chunk()?;
    if tag != TAG_RIFF {
        log::warn!(
            "File does not start with RIFF chunk, got {:?}",
            String::from_utf8_lossy(&tag)
        );
        return Err(LoadError::NotRiff);
    }

    // Container size is informational
    reader.read_u32()?;

    let format = reader.read_tag()?;
    if format != TAG_WAVE {
        log::warn!(
            "RIFF form type is not WAVE, got {:?}",
            String::from_utf8_lossy(&format)
        );
        return Err(LoadError::NotWave);
    }

    let tag = reader.next_chunk()?;
    if tag != TAG_FMT {
        log::warn!(
            "Expected fmt chunk, got {:?}",
            String::from_utf8_lossy(&tag)
        );
        return Err(LoadError::MissingFormat);
    }
    let fmt = reader.read_format_chunk()?;

    let tag = reader.next_chunk()?;
    if tag != TAG_DATA {
        log::warn!(
            "Expected data chunk, got {:?}",
            String::from_utf8_lossy(&tag)
        );
        return Err(LoadError::InvalidFile);
    }
    let data_size = reader.read_u32()?;

    let encoding = fmt.encoding()?;
    let payload = reader.read_payload(data_size)?;
    let samples = decode_samples(&payload, encoding);

    log::debug!(
        "Decoded {} samples @ {} Hz ({:?})",
        samples.len(),
        fmt.sample_rate,
        encoding
    );

    Ok(RawAudio::new(samples, f64::from(fmt.sample_rate)))
}

/// Load a mono WAV impulse response from disk.
pub fn load<P: AsRef<Path>>(path: P) -> LoadResult<RawAudio> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        log::warn!("Failed to open IR {:?}: {}", path, err);
        LoadError::Opening
    })?;

    decode(BufReader::new(file)).inspect_err(|err| {
        log::warn!("Failed to load IR at {:?}: {}", path, err);
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
