//! Negotiation descriptors and negotiated stream geometry.

use std::fmt;

use thiserror::Error;

/// Media type name for signed native-endian integer PCM.
pub const MEDIA_TYPE_INT: &str = "audio/x-raw-int";
/// Media type name for native-endian 32-bit float PCM.
pub const MEDIA_TYPE_FLOAT: &str = "audio/x-raw-float";

/// Sample encodings the filter negotiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Signed 16-bit integer, native byte order.
    S16,
    /// 32-bit float, native byte order.
    F32,
}

impl SampleEncoding {
    /// Bits per sample.
    #[must_use]
    pub const fn width_bits(self) -> u32 {
        match self {
            Self::S16 => 16,
            Self::F32 => 32,
        }
    }

    /// Bytes per sample.
    #[must_use]
    pub const fn sample_bytes(self) -> usize {
        (self.width_bits() / 8) as usize
    }

    /// Media type name this encoding negotiates under.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::S16 => MEDIA_TYPE_INT,
            Self::F32 => MEDIA_TYPE_FLOAT,
        }
    }
}

/// Byte order of samples as announced in a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Raw format descriptor exchanged between linked elements.
///
/// Fields are individually optional: a proposing endpoint fills in what it
/// knows, and validation rejects descriptors missing required fields.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatDescriptor {
    pub media_type: String,
    pub rate: Option<u32>,
    pub channels: Option<u16>,
    pub width: Option<u32>,
    pub depth: Option<u32>,
    pub signed: Option<bool>,
    pub byte_order: Option<ByteOrder>,
}

impl FormatDescriptor {
    /// Create an empty descriptor for the given media type.
    pub fn new<S: Into<String>>(media_type: S) -> Self {
        Self {
            media_type: media_type.into(),
            rate: None,
            channels: None,
            width: None,
            depth: None,
            signed: None,
            byte_order: None,
        }
    }

    /// Fully-populated descriptor for signed 16-bit integer PCM.
    #[must_use]
    pub fn s16(rate: u32, channels: u16) -> Self {
        Self::new(MEDIA_TYPE_INT)
            .with_rate(rate)
            .with_channels(channels)
            .with_width(16)
            .with_depth(16)
            .with_signed(true)
            .with_byte_order(ByteOrder::native())
    }

    /// Fully-populated descriptor for 32-bit float PCM.
    #[must_use]
    pub fn f32(rate: u32, channels: u16) -> Self {
        Self::new(MEDIA_TYPE_FLOAT)
            .with_rate(rate)
            .with_channels(channels)
            .with_width(32)
            .with_byte_order(ByteOrder::native())
    }

    /// Set the sample rate.
    #[must_use]
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Set the channel count.
    #[must_use]
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Set the sample width in bits.
    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the significant bit depth.
    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Set the signedness of integer samples.
    #[must_use]
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = Some(signed);
        self
    }

    /// Set the byte order.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = Some(byte_order);
        self
    }
}

/// Why a proposed descriptor was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("descriptor is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("sample rate must be at least 1")]
    InvalidRate,

    #[error("channel count must be at least 1")]
    InvalidChannels,

    #[error("unsupported sample width: {0} bits")]
    UnsupportedWidth(u32),

    #[error("integer depth {depth} does not match width {width}")]
    DepthMismatch { width: u32, depth: u32 },

    #[error("integer samples must be signed")]
    Unsigned,

    #[error("byte order must be native")]
    ForeignByteOrder,

    #[error("peer rejected the proposed format")]
    PeerRejected,

    #[error("cannot negotiate a different format mid-stream")]
    MidStream,
}

/// Negotiated sample geometry shared by every component of the filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    pub encoding: SampleEncoding,
    /// Samples per second, per channel.
    pub rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl StreamFormat {
    /// Validate a proposed descriptor against the accepted layouts.
    ///
    /// Accepted: 32-bit native float, or signed 16-bit native integer with
    /// depth equal to width. Rate and channel count are required and must
    /// be at least 1. Nothing is mutated on failure; the caller decides
    /// whether to commit the returned geometry.
    pub fn from_descriptor(desc: &FormatDescriptor) -> Result<Self, NegotiationError> {
        let encoding = match desc.media_type.as_str() {
            MEDIA_TYPE_INT => SampleEncoding::S16,
            MEDIA_TYPE_FLOAT => SampleEncoding::F32,
            other => return Err(NegotiationError::UnsupportedMediaType(other.to_owned())),
        };

        let rate = desc.rate.ok_or(NegotiationError::MissingField("rate"))?;
        if rate == 0 {
            return Err(NegotiationError::InvalidRate);
        }
        let channels = desc
            .channels
            .ok_or(NegotiationError::MissingField("channels"))?;
        if channels == 0 {
            return Err(NegotiationError::InvalidChannels);
        }
        let width = desc.width.ok_or(NegotiationError::MissingField("width"))?;
        if let Some(byte_order) = desc.byte_order
            && byte_order != ByteOrder::native()
        {
            return Err(NegotiationError::ForeignByteOrder);
        }

        match encoding {
            SampleEncoding::F32 => {
                if width != 32 {
                    return Err(NegotiationError::UnsupportedWidth(width));
                }
            }
            SampleEncoding::S16 => {
                if width != 16 {
                    return Err(NegotiationError::UnsupportedWidth(width));
                }
                let depth = desc.depth.ok_or(NegotiationError::MissingField("depth"))?;
                if depth != width {
                    return Err(NegotiationError::DepthMismatch { width, depth });
                }
                if !desc.signed.ok_or(NegotiationError::MissingField("signed"))? {
                    return Err(NegotiationError::Unsigned);
                }
            }
        }

        Ok(Self {
            encoding,
            rate,
            channels,
        })
    }

    /// Bits per sample.
    #[must_use]
    pub const fn width_bits(&self) -> u32 {
        self.encoding.width_bits()
    }

    /// Bytes per interleaved frame (`channels * width / 8`).
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.channels as usize * self.encoding.sample_bytes()
    }

    /// Re-encode this geometry as the descriptor it was negotiated from,
    /// for proposing the identical format to the opposite endpoint.
    #[must_use]
    pub fn descriptor(&self) -> FormatDescriptor {
        match self.encoding {
            SampleEncoding::S16 => FormatDescriptor::s16(self.rate, self.channels),
            SampleEncoding::F32 => FormatDescriptor::f32(self.rate, self.channels),
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} Hz, {} channels",
            self.encoding, self.rate, self.channels
        )
    }
}
