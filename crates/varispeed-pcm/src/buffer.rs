//! Interleaved PCM buffers with stream metadata.

use crate::format::{SampleEncoding, StreamFormat};

/// Interleaved sample storage for the two negotiated encodings.
///
/// # Invariants
/// - samples are interleaved (`LRLR...` for stereo)
/// - `len() % channels == 0` for frame-aligned buffers
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    S16(Vec<i16>),
    F32(Vec<f32>),
}

impl Samples {
    /// Zero-filled storage holding `byte_len / sample_bytes` samples.
    ///
    /// Allocators use this to provision output storage of a computed byte
    /// size; `byte_len` is expected to be sample-aligned and any remainder
    /// is dropped.
    #[must_use]
    pub fn zeroed(encoding: SampleEncoding, byte_len: usize) -> Self {
        let samples = byte_len / encoding.sample_bytes();
        match encoding {
            SampleEncoding::S16 => Self::S16(vec![0; samples]),
            SampleEncoding::F32 => Self::F32(vec![0.0; samples]),
        }
    }

    /// Encoding of the stored samples.
    #[must_use]
    pub fn encoding(&self) -> SampleEncoding {
        match self {
            Self::S16(_) => SampleEncoding::S16,
            Self::F32(_) => SampleEncoding::F32,
        }
    }

    /// Number of stored samples (across all channels).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::S16(data) => data.len(),
            Self::F32(data) => data.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored length in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len() * self.encoding().sample_bytes()
    }

    /// Shorten the storage to `samples` samples.
    pub fn truncate(&mut self, samples: usize) {
        match self {
            Self::S16(data) => data.truncate(samples),
            Self::F32(data) => data.truncate(samples),
        }
    }
}

impl From<Vec<i16>> for Samples {
    fn from(data: Vec<i16>) -> Self {
        Self::S16(data)
    }
}

impl From<Vec<f32>> for Samples {
    fn from(data: Vec<f32>) -> Self {
        Self::F32(data)
    }
}

/// One interleaved PCM buffer travelling through the pipeline.
///
/// `offset`, `pts`, and `duration` are stamped by the producing element;
/// a freshly allocated buffer carries no metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub samples: Samples,
    /// Frame-domain position of the first frame.
    pub offset: Option<u64>,
    /// Presentation timestamp in nanoseconds.
    pub pts: Option<u64>,
    /// Duration in nanoseconds.
    pub duration: Option<u64>,
}

impl AudioBuffer {
    /// Wrap samples with no stream metadata.
    #[must_use]
    pub fn new<S: Into<Samples>>(samples: S) -> Self {
        Self {
            samples: samples.into(),
            offset: None,
            pts: None,
            duration: None,
        }
    }

    /// Stored length in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.samples.byte_len()
    }

    /// Number of whole interleaved frames under the given geometry.
    #[must_use]
    pub fn frames(&self, format: &StreamFormat) -> u64 {
        if format.channels == 0 {
            return 0;
        }
        (self.samples.len() / format.channels as usize) as u64
    }
}
