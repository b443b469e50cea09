//! TP segmentation and reassembly.
//!
//! Datagram transports cannot carry messages larger than one segment, so the
//! sender splits them with [`Fragmenter`] and the receiver stitches them back
//! together with [`Reassembler`]. Each sub-module focuses on a single concept
//! while the common types are re-exported here.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod header;
pub mod id;
mod ranges;
pub mod reassembler;

pub use config::{
    DEFAULT_MAX_MESSAGE_SIZE,
    DEFAULT_REASSEMBLY_TIMEOUT,
    DEFAULT_SEGMENT_LEN,
    TpConfig,
};
pub use error::{FragmentError, FragmentationError};
pub use fragmenter::Fragmenter;
pub use header::{OFFSET_UNIT, TP_HEADER_LEN, TpHeader};
pub use id::MessageIdentity;
pub use reassembler::{ReassemblyStatus, Reassembler};
