//! # varispeed-filter
//!
//! Streaming audio time-scaling filter. Consumes interleaved PCM buffers
//! at a fixed rate/layout and produces a resampled sequence whose playback
//! speed is scaled by a configurable factor — duration is traded for
//! apparent pitch/speed with per-channel linear interpolation; the
//! sample-rate metadata never changes.
//!
//! ## Architecture
//!
//! - [`SpeedFilter`] - the element: negotiation, per-buffer processing,
//!   control-message and query translation, lifecycle
//! - [`engine`] - the linear-interpolation resampling core
//! - [`Timeline`] - running byte/frame/time bookkeeping
//! - [`Downstream`] / [`Upstream`] - seams to the neighboring elements
//!
//! ## Target API
//!
//! ```ignore
//! use varispeed_filter::{SpeedFilter, StreamEvent};
//! use varispeed_pcm::{AudioBuffer, FormatDescriptor};
//!
//! let mut filter = SpeedFilter::new();
//! filter.link_downstream(Box::new(sink));
//! filter.set_speed(1.5)?;
//! filter.negotiate(&FormatDescriptor::s16(44100, 2))?;
//! filter.process(AudioBuffer::new(samples))?;
//! ```

#![forbid(unsafe_code)]

pub mod engine;
mod event;
mod filter;
pub mod mock;
mod query;
mod state;
mod timeline;
mod traits;

pub use event::{Segment, SeekRequest, StreamEvent};
pub use filter::{ConfigError, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED, SpeedFilter};
pub use query::{QueryError, QueryKind};
pub use state::{ElementState, Transition};
pub use timeline::Timeline;
pub use traits::{Downstream, FlowError, FlowResult, Upstream};

// Re-export the PCM data model for convenience.
pub use varispeed_pcm::{
    AudioBuffer, ConvertError, FormatDescriptor, NANOS_PER_SECOND, NegotiationError, SampleEncoding,
    Samples, StreamFormat, Unit,
};
