//! A lightweight CoAP (RFC 7252) message codec, resource registry and
//! request dispatcher, ideal for constrained devices.
//!
//! This crate covers the message codec, the option registry, the resource
//! tree and CoRE Link Format discovery rendering, and the request
//! dispatcher. Application handler bodies, UDP socket I/O beyond the
//! bundled `std`-gated loop, congestion control, block-wise transfer,
//! DTLS, Observe (RFC 7641), proxying and multicast are out of scope.
//!
//! ## Usage
//! ```rust
//! use coap_server_core::{
//!     handler::{HandlerParams, Payload},
//!     message::{deserialize, serialize, Envelope},
//!     resource::{Registry, Resource},
//!     dispatch::dispatch,
//! };
//!
//! let mut registry = Registry::new();
//! registry.add(
//!     Resource::new("hi")
//!         .with_get(Box::new(|_: &HandlerParams| Ok(Payload::text("ok")))),
//! );
//!
//! let bytes = [0x40, 0x01, 0x00, 0x01, 0xB2, b'h', b'i'];
//! let request = match deserialize(&bytes).unwrap() {
//!     Envelope::Request(request) => request,
//!     Envelope::Empty { .. } => panic!("expected a request"),
//! };
//! let response = dispatch(&request, &registry).unwrap();
//! let bytes = serialize(&response).unwrap();
//! assert!(!bytes.is_empty());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

#[macro_use]
mod log;

pub mod content_format;
pub mod dispatch;
#[cfg_attr(tarpaulin, skip)]
pub mod error;
pub mod handler;
pub mod header;
pub mod message;
pub mod option;
pub mod resource;

#[cfg(feature = "std")]
pub mod server;

pub use content_format::{ContentFormat, PayloadData};
pub use error::{BadOptionContext, CoapError, HandlerError};
pub use handler::{Handler, HandlerParams, Payload};
pub use header::{Code, Header, HeaderRaw, MessageType, Method, Status};
pub use message::{deserialize, serialize, Envelope, Request, Response};
pub use option::{CoapOption, MessageOption, OptionValue};
pub use resource::{Registry, Resource, ResourceAttributes};

#[cfg(feature = "std")]
pub use server::{Server, ServerConfig};
