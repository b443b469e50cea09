//! Test support for `someip-wire`.
//!
//! Builders produce well-formed messages and deliberately damaged wire bytes;
//! drivers push bytes through a [`StreamFramer`](someip_wire::StreamFramer)
//! over an in-memory duplex stream or through a
//! [`Pipeline`](someip_wire::Pipeline) in arbitrary chunks.
//!
//! ```rust
//! use someip_testing::{frame_over_duplex, notification};
//! use someip_wire::{FrameEvent, StreamFramer};
//!
//! # async fn example() -> std::io::Result<()> {
//! let message = notification(0x1234, 0x8001, vec![1, 2, 3]);
//! let events = frame_over_duplex(StreamFramer::default(), vec![message.to_bytes().to_vec()]).await?;
//! assert_eq!(events, vec![FrameEvent::Message(message)]);
//! # Ok(())
//! # }
//! ```

pub mod builders;
pub mod drive;

pub use builders::{
    corrupt_byte,
    datagram_connection,
    junk,
    notification,
    patterned,
    peer,
    request,
    stream_connection,
};
pub use drive::{
    DEFAULT_CAPACITY,
    drive_pipeline,
    frame_over_duplex,
    frame_over_duplex_with_capacity,
};
