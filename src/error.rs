//! The errors of the `coap` module.

use alloc::string::{String, ToString};
use core::fmt;
#[cfg(feature = "std")]
use std::error;

use crate::header::MessageType;

/// Context carried by [`CoapError::BadOption`] so a caller that only got as
/// far as parsing the header and token can still build a 4.02 response
/// instead of unconditionally dropping the datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct BadOptionContext {
    pub message_type: MessageType,
    pub token: alloc::vec::Vec<u8>,
    pub message_id: u16,
    pub number: u16,
}

/// The errors that can occur while parsing, dispatching or serializing a
/// message.
#[derive(Debug, Clone, PartialEq)]
pub enum CoapError {
    /// The datagram is structurally malformed (too short, an empty message
    /// carrying a body, a payload marker with nothing after it, or a
    /// delta/length nibble of 15). Dropped, never answered.
    MessageFormat(String),
    /// The header's version field isn't 1. Dropped, never answered.
    Version,
    /// An option number isn't in the registry. Answered with 4.02 when
    /// enough of the header was parsed to build a response.
    BadOption(BadOptionContext),
    /// No resource matches the request's Uri-Path, or a handler reports its
    /// target missing. Answered with 4.04.
    NotFound,
    /// The Uri-Path is empty, the method code is unrecognized, or the token
    /// exceeds 8 bytes. Answered with 4.00.
    BadRequest(String),
    /// A content-format can't be produced on serialize (unsupported or
    /// unrecognized). Answered with 5.00.
    ContentFormat(String),
    /// The method is POST/DELETE, or a resource has no handler for an
    /// otherwise-defined method. Answered with 5.01.
    NotImplemented,
    /// Any other handler fault. Answered with 5.00.
    InternalServerError(String),
}

impl fmt::Display for CoapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoapError::MessageFormat(msg) => {
                write!(f, "CoAP error: malformed message: {}", msg)
            }
            CoapError::Version => write!(f, "CoAP error: unsupported version"),
            CoapError::BadOption(ctx) => {
                write!(f, "CoAP error: unrecognized option {}", ctx.number)
            }
            CoapError::NotFound => write!(f, "CoAP error: not found"),
            CoapError::BadRequest(msg) => {
                write!(f, "CoAP error: bad request: {}", msg)
            }
            CoapError::ContentFormat(msg) => {
                write!(f, "CoAP error: content-format: {}", msg)
            }
            CoapError::NotImplemented => write!(f, "CoAP error: not implemented"),
            CoapError::InternalServerError(msg) => {
                write!(f, "CoAP error: internal server error: {}", msg)
            }
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for CoapError {}

/// The error a resource handler returns. Narrower than [`CoapError`]: a
/// handler only ever fails in one of these three ways, and the dispatcher is
/// responsible for turning that into the right response code.
#[derive(Debug, Clone)]
pub enum HandlerError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl HandlerError {
    pub fn internal<T: ToString>(e: T) -> Self {
        HandlerError::Internal(e.to_string())
    }

    pub fn bad_request<T: ToString>(e: T) -> Self {
        HandlerError::BadRequest(e.to_string())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandlerError::NotFound => write!(f, "not found"),
            HandlerError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            HandlerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for HandlerError {}
