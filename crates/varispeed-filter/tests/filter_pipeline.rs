#![forbid(unsafe_code)]

//! End-to-end tests for the speed filter over mock peers.

use rstest::{fixture, rstest};
use varispeed_filter::{
    AudioBuffer, ElementState, FlowError, FormatDescriptor, NANOS_PER_SECOND, QueryKind, Samples,
    SeekRequest, Segment, SpeedFilter, StreamEvent, Unit,
    mock::{MockDownstream, MockUpstream},
};

/// Filter negotiated for mono s16 at 44100 Hz, in Playing state, with both
/// peers linked and handles kept for inspection.
#[fixture]
fn linked_filter() -> (SpeedFilter, MockDownstream, MockUpstream) {
    let sink = MockDownstream::new();
    let source = MockUpstream::new();
    let mut filter = SpeedFilter::new();
    filter.link_downstream(Box::new(sink.clone()));
    filter.link_upstream(Box::new(source.clone()));
    filter
        .negotiate(&FormatDescriptor::s16(44100, 1))
        .expect("negotiation");
    filter.set_state(ElementState::Playing);
    (filter, sink, source)
}

fn s16(buffer: &AudioBuffer) -> &[i16] {
    match &buffer.samples {
        Samples::S16(data) => data,
        Samples::F32(_) => panic!("expected s16 samples"),
    }
}

// ==================== Data path ====================

#[rstest]
fn double_speed_halves_the_stream(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, sink, _source) = linked_filter;
    filter.set_speed(2.0).unwrap();

    filter
        .process(AudioBuffer::new(vec![100i16, 200, 300, 400]))
        .unwrap();

    let pushed = sink.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(s16(&pushed[0]), &[150, 350]);
    assert_eq!(pushed[0].offset, Some(0));
    assert_eq!(pushed[0].pts, Some(0));
}

#[rstest]
fn unit_speed_is_byte_identical(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, sink, _source) = linked_filter;

    let input: Vec<i16> = (0..441).map(|n| (n * 37 % 2000 - 1000) as i16).collect();
    filter.process(AudioBuffer::new(input.clone())).unwrap();

    assert_eq!(s16(&sink.pushed()[0]), input.as_slice());
}

#[rstest]
fn half_speed_doubles_duration(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, sink, _source) = linked_filter;
    filter.set_speed(0.5).unwrap();

    filter
        .process(AudioBuffer::new(vec![100i16, 200, 300, 400]))
        .unwrap();

    let pushed = sink.pushed();
    // Cursor walk from -0.25 yields 7 frames; the first extrapolates
    // in[-1] := in[0].
    assert_eq!(
        s16(&pushed[0]),
        &[100, 125, 175, 225, 275, 325, 375]
    );
}

#[rstest]
fn stereo_channels_are_independent(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, sink, _source) = linked_filter;
    // Renegotiate to stereo before any data flows.
    filter
        .negotiate(&FormatDescriptor::s16(44100, 2))
        .unwrap();
    filter.set_speed(2.0).unwrap();

    let interleaved = vec![100i16, -100, 200, -200, 300, -300, 400, -400];
    filter.process(AudioBuffer::new(interleaved)).unwrap();

    assert_eq!(s16(&sink.pushed()[0]), &[150, -150, 350, -350]);
}

#[test]
fn float_stream_flows_end_to_end() {
    let sink = MockDownstream::new();
    let mut filter = SpeedFilter::new();
    filter.link_downstream(Box::new(sink.clone()));
    filter.negotiate(&FormatDescriptor::f32(48000, 1)).unwrap();
    filter.set_speed(2.0).unwrap();

    filter
        .process(AudioBuffer::new(vec![0.1f32, 0.2, 0.3, 0.4]))
        .unwrap();

    match &sink.pushed()[0].samples {
        Samples::F32(data) => {
            assert_eq!(data.len(), 2);
            assert!((data[0] - 0.15).abs() < 1e-6);
            assert!((data[1] - 0.35).abs() < 1e-6);
        }
        Samples::S16(_) => panic!("expected f32 samples"),
    }
}

#[rstest]
fn timeline_stays_consistent_across_buffers(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
) {
    let (mut filter, sink, _source) = linked_filter;
    filter.set_speed(1.5).unwrap();

    for _ in 0..20 {
        filter.process(AudioBuffer::new(vec![0i16; 441])).unwrap();
    }

    let mut expected_offset = 0u64;
    for buffer in sink.pushed() {
        assert_eq!(buffer.offset, Some(expected_offset));
        let expected_pts = expected_offset * NANOS_PER_SECOND / 44100;
        assert_eq!(buffer.pts, Some(expected_pts));
        let frames = buffer.frames(&filter.format().unwrap());
        expected_offset += frames;

        let next_pts = expected_offset * NANOS_PER_SECOND / 44100;
        assert_eq!(buffer.duration, Some(next_pts - expected_pts));
    }
    assert_eq!(filter.timeline().offset(), expected_offset);
    assert_eq!(
        filter.timeline().timestamp(),
        expected_offset * NANOS_PER_SECOND / 44100
    );
}

// ==================== Failure propagation ====================

#[test]
fn alloc_failure_is_propagated_verbatim() {
    let sink = MockDownstream::new().with_alloc_error(FlowError::Flushing);
    let mut filter = SpeedFilter::new();
    filter.link_downstream(Box::new(sink.clone()));
    filter.negotiate(&FormatDescriptor::s16(44100, 1)).unwrap();

    assert_eq!(
        filter.process(AudioBuffer::new(vec![0i16; 4])),
        Err(FlowError::Flushing)
    );
    assert!(sink.pushed().is_empty());
    // A failed buffer does not advance the timeline.
    assert_eq!(filter.timeline().offset(), 0);
}

#[test]
fn push_failure_is_propagated_verbatim() {
    let sink = MockDownstream::new().with_push_error(FlowError::Eos);
    let mut filter = SpeedFilter::new();
    filter.link_downstream(Box::new(sink));
    filter.negotiate(&FormatDescriptor::s16(44100, 1)).unwrap();

    assert_eq!(
        filter.process(AudioBuffer::new(vec![0i16; 4])),
        Err(FlowError::Eos)
    );
}

// ==================== Control messages ====================

#[rstest]
fn segment_is_rescaled_into_the_output_timeline(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
) {
    let (mut filter, sink, _source) = linked_filter;
    filter.set_speed(2.0).unwrap();

    let delivered = filter.handle_sink_event(StreamEvent::SegmentStart(Segment::new(
        Unit::Time,
        2 * NANOS_PER_SECOND,
        4 * NANOS_PER_SECOND,
    )));
    assert!(delivered);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::SegmentStart(segment) => {
            assert_eq!(segment.start, Some(NANOS_PER_SECOND));
            assert_eq!(segment.stop, Some(2 * NANOS_PER_SECOND));
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The running position was re-baselined from the scaled start.
    assert_eq!(filter.timeline().timestamp(), NANOS_PER_SECOND);
    assert_eq!(filter.timeline().offset(), 44100);
}

#[rstest]
fn byte_segment_rebases_in_frames(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, _sink, _source) = linked_filter;

    let delivered = filter.handle_sink_event(StreamEvent::SegmentStart(Segment::new(
        Unit::Bytes,
        88200,
        176_400,
    )));
    assert!(delivered);
    assert_eq!(filter.timeline().offset(), 44100);
    assert_eq!(filter.timeline().timestamp(), NANOS_PER_SECOND);
}

#[test]
fn segment_before_negotiation_is_dropped_when_it_cannot_rebase() {
    let sink = MockDownstream::new();
    let mut filter = SpeedFilter::new();
    filter.link_downstream(Box::new(sink.clone()));

    // Byte positions cannot be interpreted without a frame size.
    let delivered = filter
        .handle_sink_event(StreamEvent::SegmentStart(Segment::new(Unit::Bytes, 100, 200)));
    assert!(!delivered);
    assert!(sink.events().is_empty());
}

#[rstest]
fn eos_is_forwarded_unchanged(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, sink, _source) = linked_filter;
    assert!(filter.handle_sink_event(StreamEvent::Eos));
    assert_eq!(sink.events(), vec![StreamEvent::Eos]);
}

#[rstest]
fn unrecognized_events_take_the_default_path(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
) {
    let (mut filter, sink, _source) = linked_filter;
    filter.set_speed(2.0).unwrap();

    let event = StreamEvent::Other("tag-list".to_owned());
    assert!(filter.handle_sink_event(event.clone()));
    assert_eq!(sink.events(), vec![event]);
}

// ==================== Seeks ====================

#[rstest]
#[case(Unit::Time, NANOS_PER_SECOND, 2 * NANOS_PER_SECOND)]
#[case(Unit::Bytes, 1000, 2000)]
#[case(Unit::Frames, 22050, 44100)]
fn seeks_are_multiplied_into_the_input_timeline(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
    #[case] unit: Unit,
    #[case] requested: u64,
    #[case] forwarded: u64,
) {
    let (mut filter, _sink, source) = linked_filter;
    filter.set_speed(2.0).unwrap();

    assert!(filter.seek(SeekRequest::to(unit, requested)));

    let seeks = source.seeks();
    assert_eq!(seeks.len(), 1);
    assert_eq!(seeks[0].unit, unit);
    assert_eq!(seeks[0].start, Some(forwarded));
    assert_eq!(seeks[0].stop, None);
}

#[rstest]
fn seek_stop_bound_is_scaled_when_set(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, _sink, source) = linked_filter;
    filter.set_speed(0.5).unwrap();

    let mut request = SeekRequest::to(Unit::Time, 4 * NANOS_PER_SECOND);
    request.stop = Some(8 * NANOS_PER_SECOND);
    assert!(filter.seek(request));

    let seeks = source.seeks();
    assert_eq!(seeks[0].start, Some(2 * NANOS_PER_SECOND));
    assert_eq!(seeks[0].stop, Some(4 * NANOS_PER_SECOND));
}

#[rstest]
fn percent_seeks_pass_through_unscaled(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
) {
    let (mut filter, _sink, source) = linked_filter;
    filter.set_speed(2.0).unwrap();

    assert!(filter.seek(SeekRequest::to(Unit::Percent, 50)));
    assert_eq!(source.seeks()[0].start, Some(50));
}

#[test]
fn rejected_seek_is_reported() {
    let source = MockUpstream::new().with_seeks_rejected();
    let mut filter = SpeedFilter::new();
    filter.link_upstream(Box::new(source.clone()));

    assert!(!filter.seek(SeekRequest::to(Unit::Time, 0)));
    // The request still reached the upstream.
    assert_eq!(source.seeks().len(), 1);
}

// ==================== Queries ====================

#[rstest]
#[case(Unit::Bytes, 44100)]
#[case(Unit::Frames, 22050)]
#[case(Unit::Time, NANOS_PER_SECOND / 2)]
fn position_query_is_rescaled(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
    #[case] unit: Unit,
    #[case] expected: u64,
) {
    let (mut filter, _sink, source) = linked_filter;
    // Upstream reports 88200 bytes: one second of mono s16 at 44100 Hz.
    let source = source.with_position(Unit::Bytes, 88200);
    filter.set_speed(2.0).unwrap();

    assert_eq!(filter.query(QueryKind::Position, unit), Ok(expected));
    drop(source);
}

#[rstest]
fn duration_query_is_rescaled(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, _sink, source) = linked_filter;
    // Four seconds of input play back in two seconds at double speed.
    let _source = source.with_duration(Unit::Time, 4 * NANOS_PER_SECOND);
    filter.set_speed(2.0).unwrap();

    assert_eq!(
        filter.query(QueryKind::Duration, Unit::Time),
        Ok(2 * NANOS_PER_SECOND)
    );
    assert_eq!(
        filter.query(QueryKind::Duration, Unit::Frames),
        Ok(2 * 44100)
    );
}

#[rstest]
fn unanswered_query_fails(linked_filter: (SpeedFilter, MockDownstream, MockUpstream)) {
    let (mut filter, _sink, _source) = linked_filter;
    // The mock has no scripted reply.
    assert!(filter.query(QueryKind::Duration, Unit::Time).is_err());
}

// ==================== Lifecycle ====================

#[rstest]
fn restart_resets_the_output_timeline(
    linked_filter: (SpeedFilter, MockDownstream, MockUpstream),
) {
    let (mut filter, _sink, _source) = linked_filter;
    filter.process(AudioBuffer::new(vec![0i16; 200])).unwrap();
    assert!(filter.timeline().offset() > 0);

    filter.set_state(ElementState::Ready);
    filter.set_state(ElementState::Playing);

    assert_eq!(filter.timeline().offset(), 0);
    assert_eq!(filter.timeline().timestamp(), 0);
}
