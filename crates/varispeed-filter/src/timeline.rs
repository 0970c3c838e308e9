//! Running byte/frame/time bookkeeping for produced output.

use tracing::trace;
use varispeed_pcm::{AudioBuffer, ConvertError, NANOS_PER_SECOND, StreamFormat, Unit};

/// Tracks how much output the filter has produced, in frames and time.
///
/// The timestamp is always derived fresh from the frame offset and the
/// negotiated rate rather than accumulated per buffer, so rounding never
/// drifts across a long stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timeline {
    /// Frames produced so far (output timeline).
    offset: u64,
    /// Output stream time in nanoseconds, derived from `offset`.
    timestamp: u64,
}

impl Timeline {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: 0,
            timestamp: 0,
        }
    }

    /// Frames produced so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Output stream time in nanoseconds.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Reset to the start of the stream.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.timestamp = 0;
    }

    /// Stamp `buffer` with the position it starts at, then advance past it.
    ///
    /// The buffer carries the pre-advance offset/timestamp; its duration is
    /// the timestamp delta across the advance.
    pub fn stamp(&mut self, buffer: &mut AudioBuffer, frames: u64, format: &StreamFormat) {
        buffer.offset = Some(self.offset);
        buffer.pts = Some(self.timestamp);

        let previous = self.timestamp;
        self.offset += frames;
        self.timestamp = frames_to_nanos(self.offset, format.rate);
        buffer.duration = Some(self.timestamp.saturating_sub(previous));

        trace!(
            frames,
            offset = self.offset,
            timestamp = self.timestamp,
            "timeline advanced"
        );
    }

    /// Re-baseline the running position from a segment start value.
    ///
    /// `start` is already expressed in the output timeline. Both fields are
    /// recomputed through the conversion table; nothing is mutated if a
    /// conversion fails.
    pub fn rebase(
        &mut self,
        start: u64,
        unit: Unit,
        format: &StreamFormat,
    ) -> Result<(), ConvertError> {
        let (offset, timestamp) = match unit {
            Unit::Time => (format.convert(start, Unit::Time, Unit::Frames)?, start),
            Unit::Bytes => (
                format.convert(start, Unit::Bytes, Unit::Frames)?,
                format.convert(start, Unit::Bytes, Unit::Time)?,
            ),
            Unit::Frames => (start, format.convert(start, Unit::Frames, Unit::Time)?),
            Unit::Percent => {
                return Err(ConvertError::Unsupported {
                    from: Unit::Percent,
                    to: Unit::Frames,
                });
            }
        };

        self.offset = offset;
        self.timestamp = timestamp;
        trace!(offset, timestamp, ?unit, "timeline rebased");
        Ok(())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "quotient of a u128 scaled by 1e9 and divided by a positive \
              rate fits u64 for any reachable frame count"
)]
fn frames_to_nanos(frames: u64, rate: u32) -> u64 {
    if rate == 0 {
        return 0;
    }
    (u128::from(frames) * u128::from(NANOS_PER_SECOND) / u128::from(rate)) as u64
}

#[cfg(test)]
mod tests {
    use varispeed_pcm::{SampleEncoding, Samples};

    use super::*;

    fn mono_s16() -> StreamFormat {
        StreamFormat {
            encoding: SampleEncoding::S16,
            rate: 44100,
            channels: 1,
        }
    }

    fn empty_buffer() -> AudioBuffer {
        AudioBuffer::new(Samples::zeroed(SampleEncoding::S16, 0))
    }

    #[test]
    fn stamp_uses_pre_advance_position() {
        let mut timeline = Timeline::new();
        let format = mono_s16();

        let mut first = empty_buffer();
        timeline.stamp(&mut first, 22050, &format);
        assert_eq!(first.offset, Some(0));
        assert_eq!(first.pts, Some(0));
        assert_eq!(first.duration, Some(NANOS_PER_SECOND / 2));

        let mut second = empty_buffer();
        timeline.stamp(&mut second, 22050, &format);
        assert_eq!(second.offset, Some(22050));
        assert_eq!(second.pts, Some(NANOS_PER_SECOND / 2));
        assert_eq!(timeline.offset(), 44100);
        assert_eq!(timeline.timestamp(), NANOS_PER_SECOND);
    }

    #[test]
    fn timestamp_is_derived_not_accumulated() {
        let mut timeline = Timeline::new();
        let format = StreamFormat {
            encoding: SampleEncoding::S16,
            rate: 44100,
            channels: 1,
        };

        // 147 frames at 44100 Hz is 10/3 ms; the division never lands on a
        // whole nanosecond, so accumulation would drift within a few steps.
        for _ in 0..1000 {
            let mut buffer = empty_buffer();
            timeline.stamp(&mut buffer, 147, &format);
            let expected =
                u128::from(timeline.offset()) * 1_000_000_000 / u128::from(format.rate);
            assert_eq!(u128::from(timeline.timestamp()), expected);
        }
    }

    #[test]
    fn timeline_is_monotonic() {
        let mut timeline = Timeline::new();
        let format = mono_s16();
        let mut last = (0, 0);
        for frames in [0u64, 100, 1, 4096, 0, 7] {
            let mut buffer = empty_buffer();
            timeline.stamp(&mut buffer, frames, &format);
            assert!(timeline.offset() >= last.0);
            assert!(timeline.timestamp() >= last.1);
            last = (timeline.offset(), timeline.timestamp());
        }
    }

    #[test]
    fn reset_zeroes_both_fields() {
        let mut timeline = Timeline::new();
        let mut buffer = empty_buffer();
        timeline.stamp(&mut buffer, 500, &mono_s16());
        timeline.reset();
        assert_eq!(timeline.offset(), 0);
        assert_eq!(timeline.timestamp(), 0);
    }

    #[test]
    fn rebase_from_time() {
        let mut timeline = Timeline::new();
        timeline
            .rebase(NANOS_PER_SECOND, Unit::Time, &mono_s16())
            .unwrap();
        assert_eq!(timeline.offset(), 44100);
        assert_eq!(timeline.timestamp(), NANOS_PER_SECOND);
    }

    #[test]
    fn rebase_from_bytes() {
        let mut timeline = Timeline::new();
        timeline.rebase(88200, Unit::Bytes, &mono_s16()).unwrap();
        assert_eq!(timeline.offset(), 44100);
        assert_eq!(timeline.timestamp(), NANOS_PER_SECOND);
    }

    #[test]
    fn rebase_from_frames() {
        let mut timeline = Timeline::new();
        timeline.rebase(22050, Unit::Frames, &mono_s16()).unwrap();
        assert_eq!(timeline.offset(), 22050);
        assert_eq!(timeline.timestamp(), NANOS_PER_SECOND / 2);
    }

    #[test]
    fn failed_rebase_leaves_state_untouched() {
        let mut timeline = Timeline::new();
        let mut buffer = empty_buffer();
        timeline.stamp(&mut buffer, 100, &mono_s16());
        let before = timeline;

        let degenerate = StreamFormat {
            encoding: SampleEncoding::S16,
            rate: 0,
            channels: 0,
        };
        assert!(timeline.rebase(500, Unit::Bytes, &degenerate).is_err());
        assert_eq!(timeline, before);
    }

    #[test]
    fn rebase_rejects_percent() {
        let mut timeline = Timeline::new();
        assert!(timeline.rebase(50, Unit::Percent, &mono_s16()).is_err());
    }
}
