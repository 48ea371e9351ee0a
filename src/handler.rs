//! The capability a resource exposes for GET/PUT, and the parameters it's
//! called with.

use alloc::{collections::BTreeMap, string::String};

use crate::{content_format::PayloadData, error::HandlerError};

/// What the dispatcher hands a resource's method handler.
#[derive(Debug, Clone)]
pub struct HandlerParams {
    /// The joined Uri-Path the request matched.
    pub path: String,
    /// Uri-Query options split at the first `=`, last-write-wins.
    pub query: BTreeMap<String, String>,
    /// The numeric Content-Format of the request body, if any.
    pub content_format: Option<u32>,
    /// The request payload, unparsed.
    pub payload: alloc::vec::Vec<u8>,
}

/// A handler's successful result: a payload and the content-format it's
/// encoded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub data: PayloadData,
    pub content_format: u16,
}

impl Payload {
    pub fn text<S: Into<String>>(s: S) -> Payload {
        Payload {
            data: PayloadData::Text(s.into()),
            content_format: 0,
        }
    }

    pub fn json(value: serde_json::Value) -> Payload {
        Payload {
            data: PayloadData::Json(value),
            content_format: 50,
        }
    }
}

/// A resource's GET/PUT capability. Boxed so [`crate::resource::Resource`]
/// can hold a heterogeneous handful of closures without generic parameters
/// leaking into the registry.
pub type Handler = alloc::boxed::Box<dyn Fn(&HandlerParams) -> Result<Payload, HandlerError>>;
