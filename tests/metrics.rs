#![cfg(feature = "metrics")]
//! Tests for `someip-wire` metrics helpers.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`, both through the helpers
//! directly and through the pipeline.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use someip_testing::{datagram_connection, junk, notification, patterned, stream_connection};
use someip_wire::{
    Connection,
    Destination,
    Pipeline,
    metrics::{self as wire_metrics, Direction},
};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_value(snapshotter: &Snapshotter, name: &str, direction: Option<&str>) -> Option<u64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(key, _, _, value)| {
            let key = key.key();
            let labelled = direction.is_none_or(|wanted| {
                key.labels()
                    .any(|label| label.key() == "direction" && label.value() == wanted)
            });
            match value {
                DebugValue::Counter(count) if key.name() == name && labelled => Some(count),
                _ => None,
            }
        })
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn unit_counter_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || wire_metrics::inc_units(direction, 3));

    assert_eq!(
        counter_value(&snapshotter, wire_metrics::UNITS_PROCESSED, Some(label)),
        Some(3)
    );
}

#[rstest]
#[case(1)]
#[case(2)]
fn simple_counters_increment(#[case] expected: u64) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        for _ in 0..expected {
            wire_metrics::inc_framing_errors();
            wire_metrics::inc_reassembled();
            wire_metrics::inc_evicted();
            wire_metrics::inc_e2e_failures();
        }
    });

    for name in [
        wire_metrics::FRAMING_ERRORS,
        wire_metrics::MESSAGES_REASSEMBLED,
        wire_metrics::REASSEMBLY_EVICTIONS,
        wire_metrics::E2E_FAILURES,
    ] {
        assert_eq!(counter_value(&snapshotter, name, None), Some(expected), "{name}");
    }
}

#[rstest]
fn pipeline_records_segments_and_reassembly(datagram_connection: Connection) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let pipeline = Pipeline::default();
    let message = notification(0x1234, 0x8001, patterned(3000));

    metrics::with_local_recorder(&recorder, || {
        let units = pipeline
            .prepare_send(message, Destination::datagram(), None)
            .expect("prepare_send");
        for unit in units {
            let _ = pipeline.on_receive(&datagram_connection, unit);
        }
    });

    assert_eq!(
        counter_value(&snapshotter, wire_metrics::UNITS_PROCESSED, Some("outbound")),
        Some(3)
    );
    assert_eq!(
        counter_value(&snapshotter, wire_metrics::UNITS_PROCESSED, Some("inbound")),
        Some(3)
    );
    assert_eq!(
        counter_value(&snapshotter, wire_metrics::MESSAGES_REASSEMBLED, None),
        Some(1)
    );
}

#[rstest]
fn pipeline_records_stream_framing_errors(stream_connection: Connection) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let pipeline = Pipeline::default();

    metrics::with_local_recorder(&recorder, || {
        let results = pipeline.on_receive(&stream_connection, junk(32).into());
        assert_eq!(results.len(), 1);
    });

    assert_eq!(
        counter_value(&snapshotter, wire_metrics::FRAMING_ERRORS, None),
        Some(1)
    );
}
