//! Content-format identifiers and the payload encoding dispatch that uses
//! them when serializing a response.

use alloc::{string::String, vec::Vec};

use crate::error::CoapError;

/// The content formats this core knows how to produce. `Exi` is recognized
/// so it can be rejected with a specific message rather than falling into
/// the generic "unknown format" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    TextPlain,
    LinkFormat,
    Xml,
    OctetStream,
    Exi,
    Json,
}

impl ContentFormat {
    pub fn from_u16(number: u16) -> Option<ContentFormat> {
        match number {
            0 => Some(ContentFormat::TextPlain),
            40 => Some(ContentFormat::LinkFormat),
            41 => Some(ContentFormat::Xml),
            42 => Some(ContentFormat::OctetStream),
            47 => Some(ContentFormat::Exi),
            50 => Some(ContentFormat::Json),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ContentFormat::TextPlain => 0,
            ContentFormat::LinkFormat => 40,
            ContentFormat::Xml => 41,
            ContentFormat::OctetStream => 42,
            ContentFormat::Exi => 47,
            ContentFormat::Json => 50,
        }
    }
}

/// A handler's response payload, before it's encoded to bytes.
///
/// This is the expansion's concrete shape for what the distilled spec calls
/// the "payload value" — the Python original passes arbitrary objects
/// through `json.dumps`/`str()` untyped, but a Rust handler needs a closed
/// set of shapes to return.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadData {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

/// Encodes `data` for the wire according to `format`, per the content-format
/// dispatch table.
pub fn encode(data: &PayloadData, format: ContentFormat) -> Result<Vec<u8>, CoapError> {
    match format {
        ContentFormat::Exi => Err(CoapError::ContentFormat(
            "application/exi is not supported".into(),
        )),
        ContentFormat::TextPlain | ContentFormat::LinkFormat | ContentFormat::Xml | ContentFormat::OctetStream => {
            match data {
                PayloadData::Bytes(b) => Ok(b.clone()),
                PayloadData::Text(s) => Ok(s.as_bytes().to_vec()),
                PayloadData::Json(v) => Ok(v.to_string().into_bytes()),
            }
        }
        ContentFormat::Json => match data {
            PayloadData::Json(v) => serde_json::to_vec(v).map_err(|e| {
                CoapError::ContentFormat(alloc::format!("json encoding failed: {}", e))
            }),
            PayloadData::Text(s) => Ok(serde_json::Value::String(s.clone()).to_string().into_bytes()),
            PayloadData::Bytes(b) => Ok(b.clone()),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_round_trip() {
        for n in [0u16, 40, 41, 42, 47, 50] {
            let fmt = ContentFormat::from_u16(n).unwrap();
            assert_eq!(n, fmt.to_u16());
        }
        assert_eq!(None, ContentFormat::from_u16(16));
    }

    #[test]
    fn exi_is_rejected() {
        let err = encode(&PayloadData::Bytes(Vec::new()), ContentFormat::Exi).unwrap_err();
        assert!(matches!(err, CoapError::ContentFormat(_)));
    }

    #[test]
    fn json_encodes_value() {
        let value = serde_json::json!({"temp": 21});
        let bytes = encode(&PayloadData::Json(value), ContentFormat::Json).unwrap();
        assert_eq!(bytes, br#"{"temp":21}"#);
    }

    #[test]
    fn text_plain_passes_bytes_through() {
        let bytes = encode(&PayloadData::Text("ok".into()), ContentFormat::TextPlain).unwrap();
        assert_eq!(bytes, b"ok");
    }
}
