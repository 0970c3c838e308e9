//! Example: run a synthetic sine sweep through the speed filter.
//!
//! Generates one second of mono s16 audio, pushes it through the filter at
//! several speed factors, and reports how the output timeline contracts or
//! stretches.
//!
//! Run with:
//! ```
//! cargo run -p varispeed-filter --example varispeed_demo
//! ```

use std::error::Error;

use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;
use varispeed_filter::{
    AudioBuffer, ElementState, FormatDescriptor, NANOS_PER_SECOND, SpeedFilter,
    mock::MockDownstream,
};

const RATE: u32 = 44100;
const CHUNK_FRAMES: usize = 4410;

fn sine_chunk(start_frame: usize) -> Vec<i16> {
    (0..CHUNK_FRAMES)
        .map(|n| {
            let t = (start_frame + n) as f32 / RATE as f32;
            let sample = (t * 440.0 * std::f32::consts::TAU).sin();
            (sample * 16000.0) as i16
        })
        .collect()
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("varispeed_filter=debug".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    for speed in [0.5, 1.0, 2.0, 4.0] {
        let sink = MockDownstream::new();
        let mut filter = SpeedFilter::new();
        filter.link_downstream(Box::new(sink.clone()));
        filter.set_speed(speed)?;
        filter.negotiate(&FormatDescriptor::s16(RATE, 1))?;
        filter.set_state(ElementState::Playing);

        // One second of input, pushed in 100 ms chunks.
        for chunk in 0..10 {
            let samples = sine_chunk(chunk * CHUNK_FRAMES);
            filter.process(AudioBuffer::new(samples))?;
        }

        let timeline = filter.timeline();
        let produced_ms = timeline.timestamp() / (NANOS_PER_SECOND / 1000);
        info!(
            speed,
            frames = timeline.offset(),
            produced_ms,
            buffers = sink.pushed().len(),
            "1000 ms of input resampled"
        );
    }

    Ok(())
}
