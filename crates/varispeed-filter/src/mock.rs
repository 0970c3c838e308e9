//! Stateful mock peers for tests.
//!
//! Both mocks are cheap clones around shared state, so a test can hand one
//! copy to the filter and keep another to inspect what crossed the link.

#![allow(
    clippy::missing_panics_doc,
    reason = "test mock code; lock poisoning cannot occur with parking_lot"
)]

use std::sync::Arc;

use parking_lot::Mutex;
use varispeed_bufpool::SamplePool;
use varispeed_pcm::{AudioBuffer, FormatDescriptor, SampleEncoding, Samples, StreamFormat, Unit};

use crate::{
    event::StreamEvent,
    query::QueryKind,
    traits::{Downstream, FlowError, FlowResult, Upstream},
    SeekRequest,
};

#[derive(Default)]
struct DownstreamState {
    proposed: Vec<FormatDescriptor>,
    pushed: Vec<AudioBuffer>,
    events: Vec<StreamEvent>,
    reject_formats: bool,
    alloc_error: Option<FlowError>,
    push_error: Option<FlowError>,
}

/// Downstream sink for tests: pool-backed allocation, recorded pushes and
/// events, scriptable failures.
#[derive(Clone)]
pub struct MockDownstream {
    state: Arc<Mutex<DownstreamState>>,
    pool_s16: SamplePool<Vec<i16>>,
    pool_f32: SamplePool<Vec<f32>>,
}

impl Default for MockDownstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownstream {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DownstreamState::default())),
            pool_s16: SamplePool::new(8, 64 * 1024),
            pool_f32: SamplePool::new(8, 64 * 1024),
        }
    }

    /// Reject every proposed format.
    #[must_use]
    pub fn with_formats_rejected(self) -> Self {
        self.state.lock().reject_formats = true;
        self
    }

    /// Fail every allocation with `error`.
    #[must_use]
    pub fn with_alloc_error(self, error: FlowError) -> Self {
        self.state.lock().alloc_error = Some(error);
        self
    }

    /// Fail every push with `error`.
    #[must_use]
    pub fn with_push_error(self, error: FlowError) -> Self {
        self.state.lock().push_error = Some(error);
        self
    }

    /// Descriptors proposed during negotiation, in order.
    #[must_use]
    pub fn proposed(&self) -> Vec<FormatDescriptor> {
        self.state.lock().proposed.clone()
    }

    /// Buffers pushed so far, in order.
    #[must_use]
    pub fn pushed(&self) -> Vec<AudioBuffer> {
        self.state.lock().pushed.clone()
    }

    /// Events received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<StreamEvent> {
        self.state.lock().events.clone()
    }
}

impl Downstream for MockDownstream {
    fn propose_format(&mut self, descriptor: &FormatDescriptor) -> bool {
        let mut state = self.state.lock();
        state.proposed.push(descriptor.clone());
        !state.reject_formats
    }

    fn alloc(&mut self, byte_len: usize, format: &StreamFormat) -> FlowResult<AudioBuffer> {
        if let Some(error) = self.state.lock().alloc_error {
            return Err(error);
        }
        let samples = match format.encoding {
            SampleEncoding::S16 => {
                let buf = self
                    .pool_s16
                    .get_with(|b| b.resize(byte_len / SampleEncoding::S16.sample_bytes(), 0));
                Samples::S16(buf.into_inner())
            }
            SampleEncoding::F32 => {
                let buf = self
                    .pool_f32
                    .get_with(|b| b.resize(byte_len / SampleEncoding::F32.sample_bytes(), 0.0));
                Samples::F32(buf.into_inner())
            }
        };
        Ok(AudioBuffer::new(samples))
    }

    fn push(&mut self, buffer: AudioBuffer) -> FlowResult {
        let mut state = self.state.lock();
        if let Some(error) = state.push_error {
            return Err(error);
        }
        state.pushed.push(buffer);
        Ok(())
    }

    fn event(&mut self, event: StreamEvent) -> bool {
        self.state.lock().events.push(event);
        true
    }
}

#[derive(Default)]
struct UpstreamState {
    position: Option<(Unit, u64)>,
    duration: Option<(Unit, u64)>,
    reject_seeks: bool,
    seeks: Vec<SeekRequest>,
}

/// Upstream source for tests: scriptable query replies, recorded seeks.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<Mutex<UpstreamState>>,
}

impl MockUpstream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer position queries with `value` expressed in `unit`.
    #[must_use]
    pub fn with_position(self, unit: Unit, value: u64) -> Self {
        self.state.lock().position = Some((unit, value));
        self
    }

    /// Answer duration queries with `value` expressed in `unit`.
    #[must_use]
    pub fn with_duration(self, unit: Unit, value: u64) -> Self {
        self.state.lock().duration = Some((unit, value));
        self
    }

    /// Reject every seek request.
    #[must_use]
    pub fn with_seeks_rejected(self) -> Self {
        self.state.lock().reject_seeks = true;
        self
    }

    /// Seek requests received so far, in order.
    #[must_use]
    pub fn seeks(&self) -> Vec<SeekRequest> {
        self.state.lock().seeks.clone()
    }
}

impl Upstream for MockUpstream {
    fn seek(&mut self, request: SeekRequest) -> bool {
        let mut state = self.state.lock();
        state.seeks.push(request);
        !state.reject_seeks
    }

    fn query(&mut self, kind: QueryKind) -> Option<(Unit, u64)> {
        let state = self.state.lock();
        match kind {
            QueryKind::Position => state.position,
            QueryKind::Duration => state.duration,
        }
    }
}
