//! Linear-interpolation resampling core.
//!
//! Evaluates each channel at fractional positions spaced `speed` apart,
//! starting at `0.5 * (speed - 1.0)`, interpolating between the two
//! bracketing input frames. The arithmetic is identical for both sample
//! encodings; i16 results are stored by truncation-on-cast.

use varispeed_pcm::Samples;

/// Sample types the engine interpolates.
pub trait Sample: Copy {
    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;
}

impl Sample for i16 {
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "truncation-on-cast is the storage conversion for integer samples"
    )]
    fn from_f32(value: f32) -> Self {
        value as i16
    }
}

impl Sample for f32 {
    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(value: f32) -> Self {
        value
    }
}

/// Output allocation in bytes needed for `in_bytes` of input at `speed`:
/// `ceil(in_bytes / speed)` rounded up to whole frames.
///
/// The frame count actually produced by [`resample`] always fits; callers
/// truncate the buffer to the reported length before forwarding it.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "in_bytes / speed is non-negative and far below 2^52 for any real buffer"
)]
pub fn output_byte_capacity(in_bytes: usize, speed: f64, frame_size: usize) -> usize {
    let scaled = (in_bytes as f64 / speed).ceil() as usize;
    if frame_size == 0 {
        return scaled;
    }
    scaled.div_ceil(frame_size) * frame_size
}

/// Resample `input` into `output`, independently per channel.
///
/// Both buffers must hold the same encoding and `output` must be sized by
/// [`output_byte_capacity`]. Returns the number of frames produced; the
/// caller truncates `output` to `frames * channels` samples. The cursor
/// walk is a pure function of `speed` and the input length, so every
/// channel produces the same count.
pub fn resample(input: &Samples, output: &mut Samples, channels: usize, speed: f64) -> usize {
    if channels == 0 {
        return 0;
    }
    match (input, output) {
        (Samples::S16(input), Samples::S16(output)) => {
            resample_frames(input, output, channels, speed)
        }
        (Samples::F32(input), Samples::F32(output)) => {
            resample_frames(input, output, channels, speed)
        }
        // Mismatched encodings cannot come out of a negotiated chain.
        _ => 0,
    }
}

fn resample_frames<S: Sample>(
    input: &[S],
    output: &mut [S],
    channels: usize,
    speed: f64,
) -> usize {
    let mut frames = 0;
    for channel in 0..channels {
        frames = resample_channel(input, output, channels, channel, speed);
    }
    frames
}

/// Walk one channel of interleaved data with stride `channels`.
///
/// Each output is the linear blend of `input[floor(pos)]` and
/// `input[ceil(pos)]`. A cursor landing exactly on a frame collapses to
/// that frame, so unit speed reproduces the input sample for sample. A
/// negative first position (speeds below 1.0) extrapolates using
/// `input[-1] := input[0]`, which shapes the earliest output samples.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the cursor is >= -0.45 for accepted speeds, so ceil() is never \
              below zero and fits usize; floor() is only cast when \
              non-negative"
)]
fn resample_channel<S: Sample>(
    input: &[S],
    output: &mut [S],
    channels: usize,
    channel: usize,
    speed: f64,
) -> usize {
    let in_frames = input.len() / channels;

    let mut pos = 0.5 * (speed - 1.0);
    let mut i = pos.ceil().max(0.0) as usize;
    let mut j = 0;

    while i < in_frames {
        let floor = pos.floor();
        let frac = (pos - floor) as f32;

        let lower = if floor < 0.0 {
            input[channel]
        } else {
            input[floor as usize * channels + channel]
        };
        let upper = input[i * channels + channel];

        output[j * channels + channel] =
            S::from_f32(lower.to_f32() * (1.0 - frac) + upper.to_f32() * frac);

        pos += speed;
        i = pos.ceil().max(0.0) as usize;
        j += 1;
    }

    j
}
