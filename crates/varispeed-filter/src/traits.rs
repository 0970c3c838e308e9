//! Seams to the neighboring pipeline elements.
//!
//! The filter never owns its neighbors' machinery; it talks to the element
//! after it through [`Downstream`] (negotiation relay, output allocation,
//! buffer delivery, forwarded events) and to the element before it through
//! [`Upstream`] (rescaled seeks, position/duration queries).

use thiserror::Error;
use varispeed_pcm::{AudioBuffer, FormatDescriptor, StreamFormat, Unit};

use crate::{event::StreamEvent, query::QueryKind, SeekRequest};

/// Flow conditions a neighbor can report for a single buffer.
///
/// Every condition is propagated verbatim to the filter's caller; the
/// filter retries nothing.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("no downstream element is linked")]
    NotLinked,

    #[error("format has not been negotiated")]
    NotNegotiated,

    #[error("downstream cannot accept more data")]
    Full,

    #[error("stream is flushing")]
    Flushing,

    #[error("downstream reached end of stream")]
    Eos,

    #[error("fatal stream error")]
    Error,
}

/// Result of pushing one buffer through a link.
pub type FlowResult<T = ()> = Result<T, FlowError>;

/// The element after the filter in the data path.
pub trait Downstream: Send {
    /// Negotiation relay: accept or reject a proposed descriptor.
    fn propose_format(&mut self, descriptor: &FormatDescriptor) -> bool;

    /// Supply `byte_len` bytes of output storage tagged with `format`.
    ///
    /// Backed by the neighbor's buffer pool; may fail when the neighbor is
    /// not ready, and the failure is propagated per-buffer, not retried.
    fn alloc(&mut self, byte_len: usize, format: &StreamFormat) -> FlowResult<AudioBuffer>;

    /// Deliver a finished buffer, transferring ownership.
    fn push(&mut self, buffer: AudioBuffer) -> FlowResult;

    /// Deliver a downstream-flowing control message.
    fn event(&mut self, event: StreamEvent) -> bool;
}

/// The element before the filter in the data path.
pub trait Upstream: Send {
    /// Deliver an upstream-flowing seek request.
    fn seek(&mut self, request: SeekRequest) -> bool;

    /// Answer a position/duration query.
    ///
    /// The filter asks in time units, but a peer may answer in any unit it
    /// tracks natively; the reply carries that unit.
    fn query(&mut self, kind: QueryKind) -> Option<(Unit, u64)>;
}
