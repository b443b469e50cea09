#![cfg(test)]
//! Test-only helpers shared by unit tests.

use std::net::{Ipv4Addr, SocketAddr};

use bytes::Bytes;
use proptest::test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner};

use crate::{
    fragment::MessageIdentity,
    message::{Header, Message, MessageKind, MethodId, ServiceId, SessionId},
    session::Transport,
};

pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

pub fn peer(port: u16) -> SocketAddr { SocketAddr::from((Ipv4Addr::LOCALHOST, port)) }

pub fn notification_header(service: u16, event: u16) -> Header {
    let mut header = Header::new(
        ServiceId::new(service),
        MethodId::new(event),
        MessageKind::Notification.into(),
    );
    header.session = SessionId::new(1);
    header
}

pub fn message(header: Header, payload: impl Into<Bytes>) -> Message {
    Message::new(header, payload).expect("test payload fits the length field")
}

/// Payload whose bytes encode their own index, so misplaced bytes are visible.
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("modulus fits in u8"))
        .collect()
}

pub fn identity_for(header: &Header, port: u16) -> MessageIdentity {
    MessageIdentity::from_header(peer(port), header, Transport::Datagram)
}
