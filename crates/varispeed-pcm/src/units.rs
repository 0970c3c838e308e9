//! Byte / frame / time position conversion.
//!
//! All time-domain quantities are nanoseconds. Conversions go through
//! 128-bit intermediates so `value * NANOS_PER_SECOND` cannot overflow
//! for any representable stream position.

use thiserror::Error;

use crate::format::StreamFormat;

/// Nanoseconds per second — the fixed time-domain resolution.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Units a stream position or measurement can be expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Byte count in the interleaved stream.
    Bytes,
    /// Interleaved frames (one sample per channel).
    Frames,
    /// Stream time in nanoseconds.
    Time,
    /// Percentage of the whole stream; carried through but never converted.
    Percent,
}

impl Unit {
    /// Whether positions in this unit scale with the speed factor.
    #[must_use]
    pub const fn is_position(self) -> bool {
        matches!(self, Self::Bytes | Self::Frames | Self::Time)
    }
}

/// Why a unit conversion failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("cannot convert {from:?} to {to:?}")]
    Unsupported { from: Unit, to: Unit },

    #[error("conversion from {from:?} to {to:?} has a zero divisor")]
    ZeroDivisor { from: Unit, to: Unit },
}

impl StreamFormat {
    /// Convert `value` from one position unit to another using this
    /// geometry.
    ///
    /// Same-unit conversion is the identity. Pairs involving
    /// [`Unit::Percent`] are unsupported, and conversions dividing by the
    /// frame size or rate fail if the divisor is zero (an un-negotiated
    /// geometry). Callers abort the enclosing operation on failure.
    pub fn convert(&self, value: u64, from: Unit, to: Unit) -> Result<u64, ConvertError> {
        if from == to {
            return Ok(value);
        }

        let frame_size = self.frame_size() as u64;
        let rate = u64::from(self.rate);

        let result = match (from, to) {
            (Unit::Bytes, Unit::Frames) => {
                if frame_size == 0 {
                    return Err(ConvertError::ZeroDivisor { from, to });
                }
                value / frame_size
            }
            (Unit::Bytes, Unit::Time) => {
                let byte_rate = frame_size * rate;
                if byte_rate == 0 {
                    return Err(ConvertError::ZeroDivisor { from, to });
                }
                scale(value, NANOS_PER_SECOND, byte_rate)
            }
            (Unit::Frames, Unit::Bytes) => value * frame_size,
            (Unit::Frames, Unit::Time) => {
                if rate == 0 {
                    return Err(ConvertError::ZeroDivisor { from, to });
                }
                scale(value, NANOS_PER_SECOND, rate)
            }
            (Unit::Time, Unit::Bytes) => scale(value, frame_size * rate, NANOS_PER_SECOND),
            (Unit::Time, Unit::Frames) => scale(value, rate, NANOS_PER_SECOND),
            _ => return Err(ConvertError::Unsupported { from, to }),
        };

        Ok(result)
    }
}

/// `value * num / den` without intermediate overflow.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the quotient maps one position domain into another; it fits \
              u64 for any position reachable in a real stream"
)]
fn scale(value: u64, num: u64, den: u64) -> u64 {
    (u128::from(value) * u128::from(num) / u128::from(den)) as u64
}
