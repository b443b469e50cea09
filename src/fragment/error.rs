//! Error types emitted by the segmentation layer.
//!
//! Inbound problems are reported per segment: the offending segment is dropped
//! and its reassembly entry, if any, is left to time out. Outbound problems stop
//! the message from being segmented at all.

use thiserror::Error;

use crate::message::HeaderError;

/// Reasons an inbound segment is rejected by the reassembly table.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// The message carrying the segment does not have the TP flag set.
    #[error("message is not a TP segment")]
    NotSegmented,
    /// The payload is too short to hold a TP sub-header.
    #[error("TP header truncated: {len} payload bytes")]
    TruncatedTpHeader { len: usize },
    /// A non-final segment does not have exactly the configured length.
    #[error("non-final segment of {actual} bytes, expected exactly {expected}")]
    NonFinalLength { expected: usize, actual: usize },
    /// A final segment is longer than the configured segment length.
    #[error("segment of {actual} bytes exceeds maximum of {max}")]
    ChunkTooLong { max: usize, actual: usize },
    /// The segment ends beyond the configured maximum message size.
    #[error("segment ending at {end} exceeds maximum message size of {max}")]
    MessageTooLarge { end: usize, max: usize },
    /// A final segment declares a total different from an earlier one.
    #[error("final segment implies total {claimed} but {known} is already known")]
    TotalConflict { known: usize, claimed: usize },
    /// A segment extends past the total declared by the final segment.
    #[error("segment ending at {end} lies beyond total length {total}")]
    BeyondTotal { end: usize, total: usize },
    /// The reassembled payload cannot be described by a SOME/IP header.
    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Errors produced while segmenting outbound messages.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// A segment offset cannot be represented in the 28-bit offset field.
    #[error("segment offset {offset} cannot be encoded")]
    OffsetOverflow { offset: usize },
    /// A segment header could not be built.
    #[error(transparent)]
    Header(#[from] HeaderError),
}
