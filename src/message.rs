//! Deserializing an untrusted datagram into a [`Envelope`], and serializing
//! a [`Response`] back to bytes.

use alloc::vec::Vec;
use core::convert::TryFrom;

use crate::{
    error::{BadOptionContext, CoapError},
    header::{Code, Header, HeaderRaw, MessageType, Method, Status},
    option::{classify_nibble, encode_nibble, CoapOption, MessageOption, Nibble, OptionValue},
};

/// What deserializing a datagram yields. There's no `Response` variant here:
/// a server only ever *parses* requests (and the occasional empty
/// keepalive/ack) off the wire, and only ever *builds* responses, so the two
/// never share a decode path.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Empty {
        message_type: MessageType,
        message_id: u16,
    },
    Request(Request),
}

/// A fully parsed incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub message_type: MessageType,
    pub method: Method,
    pub message_id: u16,
    pub token: Vec<u8>,
    pub options: Vec<MessageOption>,
    pub payload: Option<Vec<u8>>,
}

impl Request {
    /// Returns the values of every `Uri-Path` option, in wire order.
    pub fn uri_path_segments(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .filter(move |o| o.number == CoapOption::UriPath.number())
            .filter_map(|o| o.value.as_str())
    }

    /// Returns the values of every `Uri-Query` option, in wire order.
    pub fn uri_query_pairs(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .filter(move |o| o.number == CoapOption::UriQuery.number())
            .filter_map(|o| o.value.as_str())
    }

    /// The numeric `Content-Format` of the request payload, if present.
    pub fn content_format(&self) -> Option<u32> {
        self.options
            .iter()
            .find(|o| o.number == CoapOption::ContentFormat.number())
            .and_then(|o| o.value.as_uint())
    }
}

/// A response built by the dispatcher, ready for [`serialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub message_type: MessageType,
    pub status: Status,
    pub message_id: u16,
    pub token: Vec<u8>,
    pub payload: Option<Vec<u8>>,
    pub content_format: Option<u16>,
}

/// Deserializes a raw UDP datagram into an [`Envelope`].
///
/// Follows RFC 7252 section 3 exactly: 4-byte header, a `token_length`-byte
/// token, delta-compressed options terminated by the datagram end or a
/// `0xFF` payload marker.
pub fn deserialize(buf: &[u8]) -> Result<Envelope, CoapError> {
    let raw = HeaderRaw::try_from(buf)?;
    let header = Header::from_raw(&raw);

    if header.get_version() != 1 {
        return Err(CoapError::Version);
    }

    let code = buf[1];
    let message_type = header.get_type();

    if buf.len() == 4 && code == 0 {
        return Ok(Envelope::Empty {
            message_type,
            message_id: header.message_id,
        });
    }
    if code == 0 {
        return Err(CoapError::MessageFormat(
            "empty message carrying a body".into(),
        ));
    }

    let method = match Code::from_raw(code) {
        Some(Code::Request(method)) => method,
        _ => {
            return Err(CoapError::MessageFormat(alloc::format!(
                "code {:#04x} is not a request method",
                code
            )))
        }
    };

    let token_length = header.get_token_length() as usize;
    let token_end = 4 + token_length;
    if buf.len() < token_end {
        return Err(CoapError::MessageFormat("token truncated".into()));
    }
    let token = buf[4..token_end].to_vec();

    let (options, payload) =
        parse_options_and_payload(buf, token_end, message_type, &token, header.message_id)?;

    Ok(Envelope::Request(Request {
        message_type,
        method,
        message_id: header.message_id,
        token,
        options,
        payload,
    }))
}

fn parse_options_and_payload(
    buf: &[u8],
    mut idx: usize,
    message_type: MessageType,
    token: &[u8],
    message_id: u16,
) -> Result<(Vec<MessageOption>, Option<Vec<u8>>), CoapError> {
    let mut options = Vec::new();
    let mut running_number: u16 = 0;

    while idx < buf.len() {
        let byte = buf[idx];
        if byte == 0xFF {
            idx += 1;
            if idx >= buf.len() {
                return Err(CoapError::MessageFormat(
                    "payload marker with no payload after it".into(),
                ));
            }
            return Ok((options, Some(buf[idx..].to_vec())));
        }

        let delta_raw = byte >> 4;
        let length_raw = byte & 0x0F;
        idx += 1;
        if delta_raw == 15 || length_raw == 15 {
            return Err(CoapError::MessageFormat(
                "option delta/length nibble of 15".into(),
            ));
        }

        let delta = read_extension(buf, &mut idx, classify_nibble(delta_raw))?;
        let length = read_extension(buf, &mut idx, classify_nibble(length_raw))? as usize;

        let number = running_number
            .checked_add(delta)
            .ok_or_else(|| CoapError::MessageFormat("option number overflow".into()))?;
        running_number = number;

        if idx + length > buf.len() {
            return Err(CoapError::MessageFormat("option value truncated".into()));
        }
        let value_bytes = &buf[idx..idx + length];
        idx += length;

        let known = CoapOption::from_number(number).ok_or_else(|| {
            CoapError::BadOption(BadOptionContext {
                message_type,
                token: token.to_vec(),
                message_id,
                number,
            })
        })?;

        options.push(MessageOption {
            number,
            value: OptionValue::decode(known.kind(), value_bytes),
        });
    }

    Ok((options, None))
}

fn read_extension(buf: &[u8], idx: &mut usize, nibble: Nibble) -> Result<u16, CoapError> {
    match nibble {
        Nibble::Literal(v) => Ok(v),
        Nibble::Ext1 => {
            if *idx >= buf.len() {
                return Err(CoapError::MessageFormat("truncated option extension".into()));
            }
            let v = buf[*idx] as u16 + 13;
            *idx += 1;
            Ok(v)
        }
        Nibble::Ext2 => {
            if *idx + 1 >= buf.len() {
                return Err(CoapError::MessageFormat("truncated option extension".into()));
            }
            let v = u16::from_be_bytes([buf[*idx], buf[*idx + 1]]) + 269;
            *idx += 2;
            Ok(v)
        }
    }
}

/// Serializes a [`Response`] to its wire representation.
pub fn serialize(response: &Response) -> Result<Vec<u8>, CoapError> {
    let mut header = Header::new();
    header.set_version(1);
    header.set_type(response.message_type);
    header.set_token_length(response.token.len() as u8);
    header.message_id = response.message_id;

    let code = Code::Response(response.status);
    let raw = header.to_raw(code);

    let mut buf = Vec::with_capacity(4 + response.token.len() + response.payload.as_ref().map_or(0, |p| p.len() + 5));
    raw.serialize_into(&mut buf);
    buf.extend(&response.token);

    let mut options: Vec<MessageOption> = Vec::new();
    if let Some(format) = response.content_format {
        options.push(MessageOption {
            number: CoapOption::ContentFormat.number(),
            value: OptionValue::Uint(format as u32),
        });
    }
    options.sort_by_key(|o| o.number);

    let mut previous_number: u16 = 0;
    for option in &options {
        let delta = option.number - previous_number;
        previous_number = option.number;
        let value_bytes = option.value.encode();

        let (delta_nibble, delta_ext) = encode_nibble(delta);
        let (length_nibble, length_ext) = encode_nibble(value_bytes.len() as u16);

        buf.push(delta_nibble << 4 | length_nibble);
        buf.extend(delta_ext);
        buf.extend(length_ext);
        buf.extend(value_bytes);
    }

    if let Some(payload) = &response.payload {
        buf.push(0xFF);
        buf.extend(payload);
    }

    Ok(buf)
}

/// Chooses the response message type for a given request type, per the
/// response-builder rule: Confirmable gets an Acknowledgement, Non-
/// Confirmable gets a Non-Confirmable reply, anything else gets no reply.
pub fn response_type_for(request_type: MessageType) -> Option<MessageType> {
    match request_type {
        MessageType::Confirmable => Some(MessageType::Acknowledgement),
        MessageType::NonConfirmable => Some(MessageType::NonConfirmable),
        MessageType::Acknowledgement | MessageType::Reset => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::Method;

    #[test]
    fn empty_ping() {
        let bytes = [0x40, 0x00, 0x12, 0x34];
        let envelope = deserialize(&bytes).unwrap();
        assert_eq!(
            Envelope::Empty {
                message_type: MessageType::Confirmable,
                message_id: 0x1234
            },
            envelope
        );
    }

    #[test]
    fn minimal_get_hi() {
        // CON GET, mid 1, token len 0, Uri-Path "hi" (option 11, delta 11, len 2)
        let bytes = [0x40, 0x01, 0x00, 0x01, 0xB2, b'h', b'i'];
        let envelope = deserialize(&bytes).unwrap();
        match envelope {
            Envelope::Request(req) => {
                assert_eq!(MessageType::Confirmable, req.message_type);
                assert_eq!(Method::Get, req.method);
                assert_eq!(0x0001, req.message_id);
                assert_eq!(alloc::vec!["hi"], req.uri_path_segments().collect::<Vec<_>>());
                assert_eq!(None, req.payload);
            }
            _ => panic!("expected a request"),
        }
    }

    #[test]
    fn rejects_short_datagram() {
        assert!(matches!(
            deserialize(&[0x40, 0x00]).unwrap_err(),
            CoapError::MessageFormat(_)
        ));
    }

    #[test]
    fn rejects_bad_version() {
        let bytes = [0x80, 0x00, 0x00, 0x00];
        assert_eq!(CoapError::Version, deserialize(&bytes).unwrap_err());
    }

    #[test]
    fn rejects_unknown_option() {
        // CON GET, Observe option (number 6) which this registry doesn't know.
        let bytes = [0x40, 0x01, 0x00, 0x01, 0x60];
        match deserialize(&bytes).unwrap_err() {
            CoapError::BadOption(ctx) => assert_eq!(6, ctx.number),
            other => panic!("expected BadOption, got {:?}", other),
        }
    }

    #[test]
    fn rejects_payload_marker_without_payload() {
        let bytes = [0x40, 0x01, 0x00, 0x01, 0xFF];
        assert!(matches!(
            deserialize(&bytes).unwrap_err(),
            CoapError::MessageFormat(_)
        ));
    }

    #[test]
    fn serialize_is_sorted_by_option_number() {
        let response = Response {
            message_type: MessageType::Acknowledgement,
            status: Status::Content,
            message_id: 1,
            token: Vec::new(),
            payload: Some(b"ok".to_vec()),
            content_format: Some(0),
        };
        let bytes = serialize(&response).unwrap();
        assert_eq!([0x60, 0x45, 0x00, 0x01], bytes[..4]);
        // Content-Format option (number 12, delta 12, len 0) then payload marker
        assert_eq!([0xC0, 0xFF, b'o', b'k'], bytes[4..]);
    }

    #[test]
    fn round_trip_with_multiple_uri_path_segments() {
        let bytes = [
            0x40, 0x01, 0x00, 0x02, // CON GET mid=2
            0xB3, b'f', b'o', b'o', // Uri-Path "foo" (delta 11)
            0x03, b'b', b'a', b'r', // Uri-Path "bar" (delta 0)
        ];
        let envelope = deserialize(&bytes).unwrap();
        match envelope {
            Envelope::Request(req) => {
                assert_eq!(
                    alloc::vec!["foo", "bar"],
                    req.uri_path_segments().collect::<Vec<_>>()
                );
            }
            _ => panic!("expected a request"),
        }
    }
}
