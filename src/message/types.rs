//! Identifier newtypes and the enumerated header fields.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::HeaderError;

macro_rules! header_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            Display, From, Into, Serialize, Deserialize,
        )]
        #[display("{_0:#06x}")]
        pub struct $name(u16);

        impl $name {
            /// Wrap a raw 16-bit identifier.
            #[must_use]
            pub const fn new(value: u16) -> Self { Self(value) }

            /// Return the raw 16-bit identifier.
            #[must_use]
            pub const fn get(self) -> u16 { self.0 }
        }
    };
}

header_id! {
    /// Service identifier carried in the first two header bytes.
    ///
    /// ```
    /// use someip_wire::message::ServiceId;
    /// assert_eq!(ServiceId::new(0x1234).to_string(), "0x1234");
    /// ```
    ServiceId
}

header_id! {
    /// Method or event identifier. Event identifiers have the top bit set.
    MethodId
}

header_id! {
    /// Client identifier assigned to the requesting application.
    ClientId
}

header_id! {
    /// Session identifier distinguishing concurrent calls from one client.
    SessionId
}

impl MethodId {
    /// Report whether the identifier lies in the event range (`0x8000..`).
    #[must_use]
    pub const fn is_event(self) -> bool { self.0 & 0x8000 != 0 }
}

/// Base message kind with the TP flag stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0x00,
    RequestNoReturn = 0x01,
    Notification = 0x02,
    RequestAck = 0x40,
    RequestNoReturnAck = 0x41,
    NotificationAck = 0x42,
    Response = 0x80,
    Error = 0x81,
    ResponseAck = 0xC0,
    ErrorAck = 0xC1,
}

impl MessageKind {
    const fn from_base(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Request,
            0x01 => Self::RequestNoReturn,
            0x02 => Self::Notification,
            0x40 => Self::RequestAck,
            0x41 => Self::RequestNoReturnAck,
            0x42 => Self::NotificationAck,
            0x80 => Self::Response,
            0x81 => Self::Error,
            0xC0 => Self::ResponseAck,
            0xC1 => Self::ErrorAck,
            _ => return None,
        })
    }

    /// Report whether this kind must always carry [`ReturnCode::OK`].
    ///
    /// Only responses and errors (and their acknowledgements) may carry a
    /// non-zero return code.
    #[must_use]
    pub const fn requires_ok_return_code(self) -> bool {
        matches!(
            self,
            Self::Request
                | Self::RequestNoReturn
                | Self::Notification
                | Self::RequestAck
                | Self::RequestNoReturnAck
                | Self::NotificationAck
        )
    }
}

/// Message type byte: a [`MessageKind`] plus the TP (segmented) flag.
///
/// # Examples
///
/// ```
/// use someip_wire::message::{MessageKind, MessageType};
/// let ty = MessageType::from_byte(0x22).expect("notification with TP flag");
/// assert_eq!(ty.kind(), MessageKind::Notification);
/// assert!(ty.is_tp());
/// assert_eq!(ty.to_byte(), 0x22);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageType {
    kind: MessageKind,
    tp: bool,
}

impl MessageType {
    /// Bit marking a message as a TP segment.
    pub const TP_FLAG: u8 = 0x20;

    /// Build an unsegmented message type.
    #[must_use]
    pub const fn new(kind: MessageKind) -> Self { Self { kind, tp: false } }

    /// Parse the on-wire message type byte.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::ReservedMessageType`] for values outside the
    /// defined set.
    pub const fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        match MessageKind::from_base(byte & !Self::TP_FLAG) {
            Some(kind) => Ok(Self {
                kind,
                tp: byte & Self::TP_FLAG != 0,
            }),
            None => Err(HeaderError::ReservedMessageType(byte)),
        }
    }

    /// Encode back into the on-wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        if self.tp {
            self.kind as u8 | Self::TP_FLAG
        } else {
            self.kind as u8
        }
    }

    /// Return the base kind.
    #[must_use]
    pub const fn kind(self) -> MessageKind { self.kind }

    /// Report whether the TP flag is set.
    #[must_use]
    pub const fn is_tp(self) -> bool { self.tp }

    /// Return a copy with the TP flag set or cleared.
    #[must_use]
    pub const fn with_tp(self, tp: bool) -> Self { Self { kind: self.kind, tp } }
}

impl From<MessageKind> for MessageType {
    fn from(kind: MessageKind) -> Self { Self::new(kind) }
}

/// Return code byte, restricted to `0x00..=0x5E`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[display("{_0:#04x}")]
pub struct ReturnCode(u8);

impl ReturnCode {
    pub const OK: Self = Self(0x00);
    pub const NOT_OK: Self = Self(0x01);
    pub const UNKNOWN_SERVICE: Self = Self(0x02);
    pub const UNKNOWN_METHOD: Self = Self(0x03);
    pub const NOT_READY: Self = Self(0x04);
    pub const NOT_REACHABLE: Self = Self(0x05);
    pub const TIMEOUT: Self = Self(0x06);
    pub const WRONG_PROTOCOL_VERSION: Self = Self(0x07);
    pub const WRONG_INTERFACE_VERSION: Self = Self(0x08);
    pub const MALFORMED_MESSAGE: Self = Self(0x09);
    pub const WRONG_MESSAGE_TYPE: Self = Self(0x0A);
    pub const E2E_REPEATED: Self = Self(0x0B);
    pub const E2E_WRONG_SEQUENCE: Self = Self(0x0C);
    pub const E2E: Self = Self(0x0D);
    pub const E2E_NOT_AVAILABLE: Self = Self(0x0E);
    pub const E2E_NO_NEW_DATA: Self = Self(0x0F);

    /// Highest value the header may carry.
    pub const MAX: u8 = 0x5E;

    /// Parse the on-wire return code byte.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidReturnCode`] for values above
    /// [`ReturnCode::MAX`].
    pub const fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        if byte <= Self::MAX {
            Ok(Self(byte))
        } else {
            Err(HeaderError::InvalidReturnCode(byte))
        }
    }

    /// Return the raw byte.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}
