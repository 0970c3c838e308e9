//! The speed filter element.

use thiserror::Error;
use tracing::{debug, trace, warn};
use varispeed_pcm::{
    AudioBuffer, FormatDescriptor, NegotiationError, SampleEncoding, StreamFormat, Unit,
};

use crate::{
    engine,
    event::{self, StreamEvent},
    query::{QueryError, QueryKind},
    state::{ElementState, Transition},
    timeline::Timeline,
    traits::{Downstream, FlowError, FlowResult, Upstream},
    SeekRequest,
};

/// Lowest accepted speed factor.
pub const MIN_SPEED: f64 = 0.1;
/// Highest accepted speed factor.
pub const MAX_SPEED: f64 = 40.0;
/// Speed of an unconfigured filter (identity).
pub const DEFAULT_SPEED: f64 = 1.0;

/// Geometry stand-in before negotiation: the zero divisors make every
/// non-identity conversion fail, so translation paths that need real
/// geometry abort instead of inventing positions.
const UNNEGOTIATED: StreamFormat = StreamFormat {
    encoding: SampleEncoding::S16,
    rate: 0,
    channels: 0,
};

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("speed {0} is outside the accepted range [0.1, 40.0]")]
    SpeedOutOfRange(f64),
}

/// Streaming audio time-scaling filter.
///
/// One instance serves one stream: it negotiates a PCM format with both
/// neighbors, resamples each input buffer by the configured speed factor,
/// keeps the output timeline consistent, and rescales the control messages
/// and queries that pass through it.
///
/// The filter is synchronous and single-threaded: each buffer is processed
/// to completion before control returns, nothing is retained across calls,
/// and the caller serializes access.
pub struct SpeedFilter {
    speed: f64,
    format: Option<StreamFormat>,
    timeline: Timeline,
    state: ElementState,
    downstream: Option<Box<dyn Downstream>>,
    upstream: Option<Box<dyn Upstream>>,
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedFilter {
    /// Create an unlinked filter at identity speed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            format: None,
            timeline: Timeline::new(),
            state: ElementState::Null,
            downstream: None,
            upstream: None,
        }
    }

    /// Link the element that receives produced buffers.
    pub fn link_downstream(&mut self, peer: Box<dyn Downstream>) {
        self.downstream = Some(peer);
    }

    /// Link the element that supplies input and answers queries.
    pub fn link_upstream(&mut self, peer: Box<dyn Upstream>) {
        self.upstream = Some(peer);
    }

    /// Configured speed factor.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed factor, validating the accepted range.
    ///
    /// Takes effect at the next buffer boundary; a change is never atomic
    /// with an in-flight buffer.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ConfigError::SpeedOutOfRange(speed));
        }
        debug!(speed, "speed configured");
        self.speed = speed;
        Ok(())
    }

    /// Negotiated stream format, if any.
    #[must_use]
    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    /// Current output timeline position.
    #[must_use]
    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ElementState {
        self.state
    }

    /// Walk the lifecycle to `target` one adjacent transition at a time.
    ///
    /// Entering Paused from Ready restarts the output timeline; every
    /// other transition passes through.
    pub fn set_state(&mut self, target: ElementState) -> ElementState {
        while let Some(next) = self.state.step_toward(target) {
            let transition = Transition {
                from: self.state,
                to: next,
            };
            if transition.resets_timeline() {
                self.timeline.reset();
                debug!("entering Paused: output timeline restarted");
            }
            self.state = next;
        }
        self.state
    }

    /// Negotiate a stream format from a proposed descriptor.
    ///
    /// The filter is format-transparent: on success the *identical*
    /// descriptor has been proposed to the downstream neighbor. Validation
    /// and the relay happen before anything is committed, so a rejection
    /// on either side mutates nothing and fails end-to-end. Once frames
    /// have been produced, only the already-negotiated format is accepted
    /// again.
    pub fn negotiate(
        &mut self,
        descriptor: &FormatDescriptor,
    ) -> Result<StreamFormat, NegotiationError> {
        let format = StreamFormat::from_descriptor(descriptor)?;

        if self.timeline.offset() > 0
            && let Some(current) = self.format
            && current != format
        {
            warn!(%current, proposed = %format, "format change rejected mid-stream");
            return Err(NegotiationError::MidStream);
        }

        if let Some(downstream) = self.downstream.as_mut()
            && !downstream.propose_format(descriptor)
        {
            debug!(%format, "downstream rejected the proposed format");
            return Err(NegotiationError::PeerRejected);
        }

        debug!(%format, frame_size = format.frame_size(), "format negotiated");
        self.format = Some(format);
        Ok(format)
    }

    /// Process one input buffer: allocate output downstream, resample,
    /// stamp the timeline, and push the result.
    ///
    /// On any failure the input buffer is released and the flow condition
    /// is returned verbatim; the filter stays usable for the next buffer.
    pub fn process(&mut self, input: AudioBuffer) -> FlowResult {
        let Some(format) = self.format else {
            return Err(FlowError::NotNegotiated);
        };
        let downstream = self.downstream.as_mut().ok_or(FlowError::NotLinked)?;

        let in_bytes = input.byte_len();
        let out_capacity = engine::output_byte_capacity(in_bytes, self.speed, format.frame_size());
        let mut output = downstream.alloc(out_capacity, &format)?;

        let channels = format.channels as usize;
        let frames = engine::resample(&input.samples, &mut output.samples, channels, self.speed);
        output.samples.truncate(frames * channels);
        drop(input);

        self.timeline.stamp(&mut output, frames as u64, &format);

        trace!(
            in_bytes,
            out_bytes = output.byte_len(),
            frames,
            speed = self.speed,
            "buffer resampled"
        );
        downstream.push(output)
    }

    /// Handle a downstream-flowing control message arriving from upstream.
    ///
    /// Segment announcements are rescaled into the output timeline and
    /// re-baseline the running position; everything else is forwarded
    /// unchanged. Returns whether the message was delivered.
    pub fn handle_sink_event(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::SegmentStart(segment) => {
                let scaled = segment.scaled(self.speed);
                if scaled.unit.is_position()
                    && let Some(start) = scaled.start
                {
                    let format = self.format.unwrap_or(UNNEGOTIATED);
                    if let Err(error) = self.timeline.rebase(start, scaled.unit, &format) {
                        warn!(%error, "segment rebase failed; announcement dropped");
                        return false;
                    }
                }
                debug!(
                    unit = ?scaled.unit,
                    start = ?scaled.start,
                    stop = ?scaled.stop,
                    speed = self.speed,
                    "segment rescaled into output timeline"
                );
                self.forward_event(StreamEvent::SegmentStart(scaled))
            }
            StreamEvent::Eos => self.forward_event(StreamEvent::Eos),
            other @ StreamEvent::Other(_) => self.forward_event(other),
        }
    }

    /// Handle a seek request arriving from downstream.
    ///
    /// Positions in byte/frame/time units are rescaled into the input
    /// timeline and forwarded upstream; requests in other units pass
    /// through unscaled. Returns whether the upstream accepted the seek.
    pub fn seek(&mut self, request: SeekRequest) -> bool {
        let Some(upstream) = self.upstream.as_mut() else {
            debug!("seek with no upstream peer");
            return false;
        };
        let forwarded = if request.unit.is_position() {
            let scaled = request.scaled(self.speed);
            trace!(
                unit = ?scaled.unit,
                start = ?scaled.start,
                stop = ?scaled.stop,
                "seek rescaled into input timeline"
            );
            scaled
        } else {
            request
        };
        upstream.seek(forwarded)
    }

    /// Answer a position or duration query in the caller's unit.
    ///
    /// The upstream is asked in time units (though it may answer in any
    /// unit it tracks natively); the reply is normalized to time, divided
    /// by the speed factor, and converted to the requested unit.
    pub fn query(&mut self, kind: QueryKind, unit: Unit) -> Result<u64, QueryError> {
        let upstream = self.upstream.as_mut().ok_or(QueryError::NoPeer)?;
        let (reply_unit, reply_value) = upstream.query(kind).ok_or(QueryError::PeerFailed)?;

        let format = self.format.unwrap_or(UNNEGOTIATED);
        let time = format.convert(reply_value, reply_unit, Unit::Time)?;
        let scaled = event::divide(time, self.speed);
        let result = format.convert(scaled, Unit::Time, unit)?;

        trace!(?kind, ?unit, upstream = reply_value, result, "query translated");
        Ok(result)
    }

    fn forward_event(&mut self, event: StreamEvent) -> bool {
        match self.downstream.as_mut() {
            Some(downstream) => downstream.event(event),
            None => false,
        }
    }
}
