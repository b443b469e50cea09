//! Configuration used by TP segmentation and reassembly.

use std::{num::NonZeroUsize, time::Duration};

use super::OFFSET_UNIT;

/// Default maximum length of a non-final segment chunk.
///
/// The largest multiple of 16 that still fits a segment, its SOME/IP header
/// and TP sub-header into the smallest supported datagram MTU.
pub const DEFAULT_SEGMENT_LEN: usize = 1392;

/// Default duration after which an inactive reassembly entry is discarded.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on the size of a reassembled payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Settings that bound segment sizes and reassembly resource usage.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use someip_wire::fragment::TpConfig;
///
/// let config = TpConfig::default().with_reassembly_timeout(Duration::from_secs(1));
/// assert_eq!(config.segment_len().get(), 1392);
/// assert!(TpConfig::new(1000).is_none(), "segments must be a multiple of 16");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TpConfig {
    segment_len: NonZeroUsize,
    max_message_size: NonZeroUsize,
    reassembly_timeout: Duration,
}

impl TpConfig {
    /// Build a configuration with a custom segment length and default limits.
    ///
    /// Returns `None` unless `segment_len` is a non-zero multiple of
    /// [`OFFSET_UNIT`].
    #[must_use]
    pub fn new(segment_len: usize) -> Option<Self> {
        if segment_len % OFFSET_UNIT != 0 {
            return None;
        }
        Some(Self {
            segment_len: NonZeroUsize::new(segment_len)?,
            ..Self::default()
        })
    }

    /// Replace the reassembly timeout.
    #[must_use]
    pub const fn with_reassembly_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = timeout;
        self
    }

    /// Replace the maximum reassembled payload size.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: NonZeroUsize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Exact length of every non-final segment chunk.
    #[must_use]
    pub const fn segment_len(&self) -> NonZeroUsize { self.segment_len }

    /// Hard cap on the reassembled payload size.
    #[must_use]
    pub const fn max_message_size(&self) -> NonZeroUsize { self.max_message_size }

    /// Inactivity period after which partial messages are discarded.
    #[must_use]
    pub const fn reassembly_timeout(&self) -> Duration { self.reassembly_timeout }
}

impl Default for TpConfig {
    fn default() -> Self {
        Self {
            segment_len: NonZeroUsize::new(DEFAULT_SEGMENT_LEN).unwrap_or(NonZeroUsize::MIN),
            max_message_size: NonZeroUsize::new(DEFAULT_MAX_MESSAGE_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
        }
    }
}
