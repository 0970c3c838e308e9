//! Control messages flowing through the filter and their speed scaling.
//!
//! Segment announcements travel downstream and are rescaled into the
//! output timeline (divide by speed); seek requests travel upstream and
//! are rescaled into the input timeline (multiply by speed). Unset
//! positions mean "no change" and are never touched.

use varispeed_pcm::Unit;

/// Downstream-flowing control messages.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Announces the start of a playback segment.
    SegmentStart(Segment),
    /// End of stream; forwarded unchanged.
    Eos,
    /// Any other message kind, named but not interpreted; forwarded
    /// unchanged via the default path.
    Other(String),
}

/// A labeled sub-range of the stream's timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Whether this updates a previously announced segment.
    pub update: bool,
    /// Rate multiplier announced by the producer; carried through untouched.
    pub rate: f64,
    /// Unit of `start` and `stop`.
    pub unit: Unit,
    pub start: Option<u64>,
    pub stop: Option<u64>,
    /// Accumulated base offset; carried through untouched.
    pub base: u64,
}

impl Segment {
    /// A segment spanning `start..stop` in `unit` at unit rate.
    #[must_use]
    pub fn new(unit: Unit, start: u64, stop: u64) -> Self {
        Self {
            update: false,
            rate: 1.0,
            unit,
            start: Some(start),
            stop: Some(stop),
            base: 0,
        }
    }

    /// Rescale set positions into the output timeline, which runs `speed`
    /// times faster than the input.
    #[must_use]
    pub(crate) fn scaled(&self, speed: f64) -> Self {
        Self {
            start: self.start.map(|v| divide(v, speed)),
            stop: self.stop.map(|v| divide(v, speed)),
            ..self.clone()
        }
    }
}

/// Upstream-flowing seek request.
///
/// `start` and `stop` are individually optional: `None` leaves that bound
/// unchanged at the source.
#[derive(Clone, Debug, PartialEq)]
pub struct SeekRequest {
    /// Requested playback rate; carried through untouched.
    pub rate: f64,
    /// Unit of `start` and `stop`.
    pub unit: Unit,
    pub start: Option<u64>,
    pub stop: Option<u64>,
}

impl SeekRequest {
    /// Seek to `start` in `unit`, leaving the stop bound unchanged.
    #[must_use]
    pub fn to(unit: Unit, start: u64) -> Self {
        Self {
            rate: 1.0,
            unit,
            start: Some(start),
            stop: None,
        }
    }

    /// Rescale set positions into the input timeline, which runs at
    /// `1/speed` of the output rate.
    #[must_use]
    pub(crate) fn scaled(&self, speed: f64) -> Self {
        Self {
            start: self.start.map(|v| multiply(v, speed)),
            stop: self.stop.map(|v| multiply(v, speed)),
            ..self.clone()
        }
    }
}

/// Divide a position by the speed factor, truncating toward zero.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "positions scaled by an in-range speed stay non-negative and \
              well below 2^63; truncation toward zero is the intended \
              storage conversion"
)]
pub(crate) fn divide(value: u64, speed: f64) -> u64 {
    (value as f64 / speed) as u64
}

/// Multiply a position by the speed factor, truncating toward zero.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "positions scaled by an in-range speed stay non-negative and \
              well below 2^63; truncation toward zero is the intended \
              storage conversion"
)]
pub(crate) fn multiply(value: u64, speed: f64) -> u64 {
    (value as f64 * speed) as u64
}
