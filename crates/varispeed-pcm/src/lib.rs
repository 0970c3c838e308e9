//! # varispeed-pcm
//!
//! PCM data model for the varispeed filter: sample encodings, the raw
//! format descriptor exchanged during negotiation, negotiated stream
//! geometry, byte/frame/time unit conversion, and interleaved buffers.
//!
//! The filter element itself lives in `varispeed-filter`; this crate holds
//! the leaf types both endpoints of a link agree on.

#![forbid(unsafe_code)]

mod buffer;
mod format;
mod units;

pub use buffer::{AudioBuffer, Samples};
pub use format::{
    ByteOrder, FormatDescriptor, MEDIA_TYPE_FLOAT, MEDIA_TYPE_INT, NegotiationError,
    SampleEncoding, StreamFormat,
};
pub use units::{ConvertError, NANOS_PER_SECOND, Unit};
