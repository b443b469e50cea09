//! Tests for the protection profiles against known-good payloads.

use bytes::Bytes;
use proptest::{collection::vec, prelude::any, prop_assert, prop_assert_eq, strategy::Strategy};
use rstest::rstest;

use super::*;
use crate::{
    byte_order::encode_u32,
    crc::{crc32p4, crc32p4_update},
    message::{Header, MessageKind, MethodId, ServiceId, SessionId},
    test_helpers::{deterministic_runner, notification_header},
};

fn event_header() -> Header { notification_header(0x1234, 0x8001) }

fn nibble_profile() -> E2eConfig {
    E2eConfig::Crc8(Crc8Config::new(0, 0xA73, DataIdMode::Nibble, 56))
}

fn crc32_profile(counter_at: usize) -> E2eConfig {
    E2eConfig::Crc32(Crc32Config::new(0).with_counter_at(counter_at))
}

#[rstest]
#[case::crc8_method(nibble_profile(), [0x82, 0xa4, 0xe3, 0xff, 0xff, 0xff, 0xff, 0xff], 4)]
#[case::crc8_method_next(nibble_profile(), [0x39, 0xa8, 0xe3, 0xff, 0xff, 0xff, 0xff, 0xff], 8)]
#[case::crc8_event(nibble_profile(), [0xa4, 0xa1, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff], 1)]
#[case::crc8_event_next(nibble_profile(), [0x05, 0xa2, 0x01, 0xff, 0xff, 0xff, 0xff, 0xff], 2)]
#[case::crc32_method(crc32_profile(5), [0xa4, 0xb2, 0x75, 0x1f, 0xff, 0x00, 0xff, 0x32], 0)]
#[case::crc32_method_next(crc32_profile(5), [0xa5, 0x70, 0x1f, 0x28, 0xff, 0x01, 0xff, 0x32], 1)]
#[case::crc32_event(crc32_profile(6), [0x89, 0x0e, 0xbc, 0x80, 0xff, 0xff, 0x00, 0x32], 0)]
fn known_payloads_verify(
    #[case] config: E2eConfig,
    #[case] payload: [u8; 8],
    #[case] counter: u16,
) {
    assert_eq!(
        check(&config, &event_header(), &payload),
        CheckOutcome::Valid {
            counter: Some(counter),
        }
    );

    let mut unprotected = payload;
    unprotected[0] = 0;
    if config.kind() == ProfileKind::Crc32 {
        unprotected[..4].fill(0);
    }
    let reprotected = protect(
        &config,
        &event_header(),
        Bytes::copy_from_slice(&unprotected),
        counter,
    )
    .expect("payload fits the profile");
    assert_eq!(reprotected.as_ref(), &payload);
}

#[rstest]
#[case::crc8(nibble_profile(), [0x82, 0xa4, 0xe3, 0xff, 0xff, 0xff, 0xff, 0xff])]
#[case::crc8_event(nibble_profile(), [0xa4, 0xa1, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff])]
#[case::crc32(crc32_profile(5), [0xa4, 0xb2, 0x75, 0x1f, 0xff, 0x00, 0xff, 0x32])]
fn any_single_byte_change_is_detected(#[case] config: E2eConfig, #[case] payload: [u8; 8]) {
    for index in 0..payload.len() {
        for flip in 1..=u8::MAX {
            let mut corrupted = payload;
            corrupted[index] ^= flip;
            assert!(
                !check(&config, &event_header(), &corrupted).is_valid(),
                "byte {index} xor {flip:#04x} went unnoticed"
            );
        }
    }
}

fn any_config() -> impl Strategy<Value = E2eConfig> {
    let crc8 = (any::<u16>(), 0u8..4, 0usize..4).prop_map(|(data_id, mode, crc_offset)| {
        let mode = DataIdMode::try_from(mode).expect("mode in range");
        let mut config = Crc8Config::new(crc_offset, data_id, mode, 96);
        config.counter_offset = 8 * (crc_offset + 1);
        config.data_id_nibble_offset = 8 * (crc_offset + 1) + 4;
        E2eConfig::Crc8(config)
    });
    let crc32 = (0usize..4, proptest::option::of(8usize..10)).prop_map(|(crc_offset, counter)| {
        E2eConfig::Crc32(Crc32Config {
            crc_offset,
            counter_offset: counter,
        })
    });
    let p04 = (any::<u32>(), 8usize..12).prop_map(|(data_id, offset_bytes)| {
        E2eConfig::P04(P04Config {
            offset: offset_bytes * 8,
            ..P04Config::new(data_id)
        })
    });
    proptest::prop_oneof![crc8, crc32, p04]
}

#[test]
fn protected_payloads_always_verify() {
    let mut runner = deterministic_runner(256);
    let strategy = (any_config(), vec(any::<u8>(), 16..64), any::<u16>());

    runner
        .run(&strategy, |(config, payload, counter)| {
            let protected = protect(&config, &event_header(), Bytes::from(payload), counter)
                .map_err(|err| proptest::test_runner::TestCaseError::fail(err.to_string()))?;
            let outcome = check(&config, &event_header(), &protected);
            prop_assert!(outcome.is_valid(), "{outcome:?}");
            let expected = match config {
                E2eConfig::Crc8(_) => Some(counter % u16::from(crc8::COUNTER_MODULUS)),
                E2eConfig::Crc32(profile) => profile.counter_offset.map(|_| counter & 0xFF),
                E2eConfig::P04(_) => Some(counter),
                E2eConfig::Unknown => None,
            };
            prop_assert_eq!(outcome.counter(), expected);
            Ok(())
        })
        .expect("protect/check must round-trip");
}

#[test]
fn protect_is_deterministic() {
    let payload = Bytes::from_static(&[0u8; 12]);
    let first = protect(&nibble_profile(), &event_header(), payload.clone(), 3).expect("protect");
    let second = protect(&nibble_profile(), &event_header(), payload, 3).expect("protect");
    assert_eq!(first, second);
}

#[rstest]
#[case::crc8(nibble_profile(), 8)]
#[case::crc32(crc32_profile(5), 6)]
#[case::p04(E2eConfig::P04(P04Config::new(1)), 12)]
fn short_payloads_are_rejected(#[case] config: E2eConfig, #[case] required: usize) {
    assert_eq!(config.min_len(), required);
    let short = vec![0u8; required - 1];
    assert_eq!(check(&config, &event_header(), &short), CheckOutcome::TooShort);
    assert_eq!(
        protect(&config, &event_header(), Bytes::from(short), 0),
        Err(E2eError::TooShort {
            required,
            actual: required - 1,
        })
    );
}

#[test]
fn unknown_profile_passes_through() {
    let payload = Bytes::from_static(b"untouched");
    assert_eq!(
        protect(&E2eConfig::Unknown, &event_header(), payload.clone(), 9),
        Ok(payload.clone())
    );
    let outcome = check(&E2eConfig::Unknown, &event_header(), &payload);
    assert_eq!(outcome, CheckOutcome::NotChecked);
    assert!(outcome.is_valid());
    assert!(!outcome.is_checked());
}

#[test]
fn alternating_mode_depends_on_counter_parity() {
    let config = E2eConfig::Crc8(Crc8Config::new(0, 0x1234, DataIdMode::Alternating, 64));
    let even = protect(&config, &event_header(), Bytes::from_static(&[0; 9]), 2).expect("protect");
    let odd = protect(&config, &event_header(), Bytes::from_static(&[0; 9]), 3).expect("protect");
    assert_ne!(even[0], odd[0]);
    assert!(check(&config, &event_header(), &even).is_valid());
    assert!(check(&config, &event_header(), &odd).is_valid());
}

#[test]
fn counters_wrap_at_profile_width() {
    let mut crc8 = ProtectionCounter::for_config(&nibble_profile()).starting_at(14);
    assert_eq!(crc8.advance(), 14);
    assert_eq!(crc8.current(), 0);

    let mut crc32 = ProtectionCounter::for_config(&crc32_profile(5)).starting_at(255);
    assert_eq!(crc32.advance(), 255);
    assert_eq!(crc32.current(), 0);

    let mut p04 = ProtectionCounter::for_config(&E2eConfig::P04(P04Config::new(1)));
    assert_eq!(p04.starting_at(255).advance(), 255);
    p04 = p04.starting_at(u16::MAX);
    assert_eq!(p04.advance(), u16::MAX);
    assert_eq!(p04.current(), 0);
}

#[rstest]
#[case::counter_on_crc(E2eConfig::Crc32(Crc32Config::new(0).with_counter_at(2)))]
#[case::nibble_on_counter({
    let mut config = Crc8Config::new(0, 1, DataIdMode::Nibble, 56);
    config.data_id_nibble_offset = config.counter_offset;
    E2eConfig::Crc8(config)
})]
#[case::counter_in_crc_byte({
    let mut config = Crc8Config::new(1, 1, DataIdMode::Low, 56);
    config.counter_offset = 12;
    E2eConfig::Crc8(config)
})]
#[case::p04_unaligned(E2eConfig::P04(P04Config { offset: 68, ..P04Config::new(1) }))]
#[case::p04_inside_header(E2eConfig::P04(P04Config { offset: 32, ..P04Config::new(1) }))]
#[case::p04_oversized(E2eConfig::P04(P04Config { max_data_length: 70_000, ..P04Config::new(1) }))]
#[case::p04_zero_delta(E2eConfig::P04(P04Config { max_delta_counter: 0, ..P04Config::new(1) }))]
fn colliding_layouts_are_rejected(#[case] config: E2eConfig) {
    assert!(matches!(
        config.validate(),
        Err(E2eError::InvalidConfig { .. })
    ));
}

#[test]
fn registry_bindings_are_immutable() {
    let registry = E2eRegistry::new();
    let service = ServiceId::new(0x1234);
    let element = MethodId::new(0x8001);

    registry
        .register(service, element, nibble_profile())
        .expect("first registration");
    assert_eq!(
        registry.register(service, element, crc32_profile(5)),
        Err(RegistryError::AlreadyRegistered { service, element })
    );
    assert_eq!(registry.get(service, element).as_deref(), Some(&nibble_profile()));
    assert!(registry.get(service, MethodId::new(0x8002)).is_none());
    assert_eq!(registry.len(), 1);
}

#[test]
fn registry_rejects_invalid_layouts() {
    let registry = E2eRegistry::new();
    let bad = E2eConfig::Crc32(Crc32Config::new(4).with_counter_at(5));
    assert!(matches!(
        registry.register(ServiceId::new(1), MethodId::new(1), bad),
        Err(RegistryError::Config(E2eError::InvalidConfig { .. }))
    ));
    assert!(registry.is_empty());
}

/// Three consecutive events captured from a profile 4 sender: data-ID
/// 0x0100002D, counters 0x8f81 to 0x8f83.
const P04_EVENTS: [[u8; 72]; 3] = [
    [
        0x00, 0x50, 0x8f, 0x81, 0x01, 0x00, 0x00, 0x2d, 0xed, 0x6e, 0x78, 0x8d, 0x08, 0xb7, 0xf4,
        0x4c, 0x00, 0x00, 0x09, 0x3d, 0x00, 0x01, 0x06, 0xfe, 0x01, 0x3e, 0x4c, 0xcc, 0xcd, 0x80,
        0x3f, 0xb2, 0x3d, 0x83, 0x3e, 0xba, 0x68, 0xed, 0x3f, 0xb3, 0x7a, 0xf2, 0xbd, 0x96, 0xc1,
        0x42, 0x3d, 0x25, 0x1a, 0x62, 0xbd, 0xae, 0x77, 0xf3, 0x3f, 0x80, 0x00, 0x00, 0xfc, 0x01,
        0x01, 0x3c, 0x1d, 0xbd, 0x4e, 0x01, 0x01, 0x3c, 0x2b, 0x87, 0xed, 0x00,
    ],
    [
        0x00, 0x50, 0x8f, 0x82, 0x01, 0x00, 0x00, 0x2d, 0x9d, 0xbb, 0x49, 0x3f, 0x0c, 0x69, 0x02,
        0x1c, 0x00, 0x00, 0x09, 0x3d, 0x00, 0x01, 0x06, 0xfe, 0x01, 0x3e, 0x4c, 0xcc, 0xcd, 0x80,
        0x3f, 0xb2, 0x3c, 0x2f, 0x3e, 0xba, 0x46, 0x81, 0x3f, 0xb3, 0x73, 0x8d, 0xbd, 0x93, 0xcb,
        0xae, 0x3c, 0xf7, 0xd2, 0x58, 0xbd, 0xa2, 0x6e, 0xcd, 0x3f, 0x80, 0x00, 0x00, 0xfc, 0x01,
        0x01, 0x3c, 0x1c, 0x89, 0x24, 0x01, 0x01, 0x3c, 0x2b, 0x24, 0x45, 0x00,
    ],
    [
        0x00, 0x50, 0x8f, 0x83, 0x01, 0x00, 0x00, 0x2d, 0x13, 0x04, 0xf8, 0x81, 0x10, 0x1b, 0x28,
        0xae, 0x00, 0x00, 0x09, 0x3d, 0x00, 0x01, 0x06, 0xfe, 0x01, 0x3e, 0x4c, 0xcc, 0xcd, 0x80,
        0x3f, 0xb2, 0x3e, 0xf3, 0x3e, 0xba, 0x97, 0x45, 0x3f, 0xb3, 0x86, 0x81, 0xbd, 0x8a, 0xda,
        0xc2, 0x3c, 0xf6, 0x00, 0x7a, 0xbd, 0xb4, 0xf9, 0xb9, 0x3f, 0x80, 0x00, 0x00, 0xfc, 0x01,
        0x01, 0x3c, 0x1c, 0x1b, 0x72, 0x01, 0x01, 0x3c, 0x2a, 0x9e, 0x1f, 0x00,
    ],
];

fn p04_profile() -> E2eConfig { E2eConfig::P04(P04Config::new(0x0100_002D)) }

/// Header the captured events travelled with: client and session zero,
/// interface version 1.
fn p04_event_header() -> Header {
    let mut header = Header::new(
        ServiceId::new(0x1234),
        MethodId::new(0x8001),
        MessageKind::Notification.into(),
    );
    header.interface_version = 1;
    header
}

#[rstest]
#[case(0, 0x8f81)]
#[case(1, 0x8f82)]
#[case(2, 0x8f83)]
fn captured_profile_four_events_verify(#[case] index: usize, #[case] counter: u16) {
    let payload = P04_EVENTS[index];
    assert_eq!(
        check(&p04_profile(), &p04_event_header(), &payload),
        CheckOutcome::Valid {
            counter: Some(counter),
        }
    );

    let mut unprotected = payload;
    unprotected[..p04::E2E_HEADER_LEN].fill(0);
    let reprotected = protect(
        &p04_profile(),
        &p04_event_header(),
        Bytes::copy_from_slice(&unprotected),
        counter,
    )
    .expect("payload fits the profile");
    assert_eq!(reprotected.as_ref(), &payload);
}

#[test]
fn profile_four_crc_covers_the_header_fields() {
    let mut header = p04_event_header();
    header.session = SessionId::new(1);
    assert!(matches!(
        check(&p04_profile(), &header, &P04_EVENTS[0]),
        CheckOutcome::WrongCrc { .. }
    ));

    // Service and method precede the length field and stay outside the area.
    let mut header = p04_event_header();
    header.service = ServiceId::new(0xBEEF);
    assert!(check(&p04_profile(), &header, &P04_EVENTS[0]).is_valid());
}

#[test]
fn profile_four_rejects_a_foreign_data_id() {
    let other_instance = E2eConfig::P04(P04Config::new(0x0200_002D));
    let outcome = check(&other_instance, &p04_event_header(), &P04_EVENTS[0]);
    assert_eq!(outcome, CheckOutcome::Mismatch { counter: 0x8f81 });
    assert!(!outcome.is_valid());
}

#[test]
fn profile_four_rejects_a_stale_length_field() {
    let mut padded = P04_EVENTS[0].to_vec();
    padded.push(0);
    let wire = p04_event_header().to_bytes();
    let crc = crc32p4_update(crc32p4(&wire[8..]), &padded[..8]);
    let crc = crc32p4_update(crc, &padded[12..]);
    padded[8..12].copy_from_slice(&encode_u32(crc));

    assert_eq!(
        check(&p04_profile(), &p04_event_header(), &padded),
        CheckOutcome::Mismatch { counter: 0x8f81 }
    );
}

#[test]
fn profile_four_enforces_the_maximum_length() {
    let config = E2eConfig::P04(P04Config {
        max_data_length: 40,
        ..P04Config::new(1)
    });
    assert_eq!(
        check(&config, &p04_event_header(), &P04_EVENTS[0]),
        CheckOutcome::TooLong
    );
    assert_eq!(
        protect(&config, &p04_event_header(), Bytes::from_static(&[0; 33]), 0),
        Err(E2eError::TooLong {
            limit: 32,
            actual: 33,
        })
    );
}

#[test]
fn registry_tracks_profile_four_counters() {
    let registry = E2eRegistry::new();
    let header = p04_event_header();
    registry
        .register(header.service, header.method, p04_profile())
        .expect("register");

    let outcomes: Vec<CheckOutcome> = [0, 1, 1, 2]
        .into_iter()
        .map(|index| registry.verify(&header, &P04_EVENTS[index]))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            CheckOutcome::Valid { counter: Some(0x8f81) },
            CheckOutcome::Valid { counter: Some(0x8f82) },
            CheckOutcome::WrongSequence { counter: 0x8f82 },
            CheckOutcome::Valid { counter: Some(0x8f83) },
        ]
    );
}

#[rstest]
#[case::within_delta(2, CheckOutcome::Valid { counter: Some(0x8f83) })]
#[case::beyond_delta(1, CheckOutcome::WrongSequence { counter: 0x8f83 })]
fn registry_applies_the_configured_counter_delta(
    #[case] max_delta_counter: u16,
    #[case] expected: CheckOutcome,
) {
    let registry = E2eRegistry::new();
    let header = p04_event_header();
    let config = E2eConfig::P04(P04Config {
        max_delta_counter,
        ..P04Config::new(0x0100_002D)
    });
    registry
        .register(header.service, header.method, config)
        .expect("register");

    assert!(registry.verify(&header, &P04_EVENTS[0]).is_valid());
    assert_eq!(registry.verify(&header, &P04_EVENTS[2]), expected);
}

#[test]
fn registry_leaves_crc_failures_out_of_the_sequence() {
    let registry = E2eRegistry::new();
    let header = p04_event_header();
    registry
        .register(header.service, header.method, p04_profile())
        .expect("register");

    let mut corrupted = P04_EVENTS[1];
    corrupted[40] ^= 0x01;
    assert!(matches!(
        registry.verify(&header, &corrupted),
        CheckOutcome::WrongCrc { .. }
    ));
    assert!(registry.verify(&header, &P04_EVENTS[0]).is_valid());
    assert!(registry.verify(&header, &P04_EVENTS[1]).is_valid());
    assert_eq!(
        registry.verify(&notification_header(0x9999, 0x8001), &P04_EVENTS[2]),
        CheckOutcome::NotChecked
    );
}
