#![doc(html_root_url = "https://docs.rs/someip-wire/latest")]
//! Wire-integrity layer for SOME/IP.
//!
//! This crate sits between sockets and the rest of a SOME/IP stack. It frames
//! byte streams, resynchronises after corruption, segments and reassembles
//! large datagram payloads (SOME/IP-TP), and applies or verifies end-to-end
//! CRC protection. It performs no I/O of its own: callers hand in received
//! bytes and get back messages, and hand in messages and get back buffers.

pub mod byte_order;
mod clock;
pub mod codec;
pub mod crc;
pub mod e2e;
pub mod fragment;
pub mod message;
pub mod metrics;
pub mod pipeline;
pub mod session;

pub use codec::{FrameEvent, FramerConfig, FramingError, StreamFramer};
pub use e2e::{CheckOutcome, E2eConfig, E2eRegistry, ProtectionCounter};
pub use fragment::{
    FragmentError,
    FragmentationError,
    Fragmenter,
    MessageIdentity,
    ReassemblyStatus,
    Reassembler,
    TpConfig,
    TpHeader,
};
pub use message::{Header, HeaderError, MagicCookie, Message};
pub use metrics::{
    Direction,
    E2E_FAILURES,
    FRAMING_ERRORS,
    MESSAGES_REASSEMBLED,
    REASSEMBLY_EVICTIONS,
    UNITS_PROCESSED,
};
pub use pipeline::{Delivery, Destination, Inbound, Pipeline, PipelineConfig, SendError};
pub use session::{Connection, ConnectionId, Transport};

#[cfg(test)]
mod test_helpers;
