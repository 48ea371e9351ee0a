//! Routes a parsed request to a resource, turns the outcome into a
//! response code, and picks the response message type.
//!
//! Grounded on the original Python reference's `CoapServer.handle_request`
//! and `make_response`: look the path up in the resource table, call the
//! method-appropriate callable, map what it returns (or raises) onto a
//! response code.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use crate::{
    content_format,
    error::HandlerError,
    handler::HandlerParams,
    header::{Method, MessageType, Status},
    message::{self, Request, Response},
    resource::Registry,
};

const MAX_TOKEN_LEN: usize = 8;
const WELL_KNOWN_CORE: &str = ".well-known/core";

/// Dispatches `request` against `registry`, returning the response to send,
/// or `None` if the request's message type never gets a reply (Ack/Reset).
pub fn dispatch(request: &Request, registry: &Registry) -> Option<Response> {
    let response_type = message::response_type_for(request.message_type)?;

    let response = dispatch_inner(request, registry, response_type);
    Some(response)
}

fn dispatch_inner(request: &Request, registry: &Registry, response_type: MessageType) -> Response {
    if request.token.len() > MAX_TOKEN_LEN {
        coap_warn!("rejecting request with oversized token ({} bytes)", request.token.len());
        return text_response(response_type, request, Status::BadRequest, "Bad Request");
    }

    let path = request.uri_path_segments().collect::<Vec<_>>().join("/");
    if path.is_empty() {
        return text_response(response_type, request, Status::BadRequest, "Bad Request");
    }

    // The discovery resource is synthesized from the registry itself rather
    // than registered as an ordinary resource, the way the original's
    // `CoapServer.start()` auto-adds a `WellKnownCore` resource whose GET
    // renders `getResourcesInCoRELinkFormat()`. A `Handler` closure has no
    // way to borrow the `Registry` it's stored in, so this is done here
    // instead of through the normal get/put dispatch below.
    if path == WELL_KNOWN_CORE && request.method == Method::Get {
        let data = content_format::PayloadData::Text(registry.render_core_link_format());
        return payload_response(
            response_type,
            request,
            Status::Content,
            &data,
            content_format::ContentFormat::LinkFormat,
        );
    }

    let query = parse_query(request.uri_query_pairs());
    let content_format = request.content_format();

    let resource = match registry.get(&path) {
        Some(resource) => resource,
        None => {
            coap_debug!("no resource registered at {}", path);
            return text_response(response_type, request, Status::NotFound, "Not Found");
        }
    };

    let params = HandlerParams {
        path,
        query,
        content_format,
        payload: request.payload.clone().unwrap_or_default(),
    };

    match request.method {
        Method::Get => match &resource.get {
            Some(handler) => respond_to_handler_result(response_type, request, Status::Content, handler(&params)),
            None => text_response(response_type, request, Status::Content, "Not Implemented"),
        },
        Method::Put => match &resource.put {
            Some(handler) => respond_to_handler_result(response_type, request, Status::Created, handler(&params)),
            None => text_response(response_type, request, Status::Created, "Not Implemented"),
        },
        Method::Post | Method::Delete => {
            text_response(response_type, request, Status::NotImplemented, "Not Implemented")
        }
    }
}

fn respond_to_handler_result(
    response_type: MessageType,
    request: &Request,
    success: Status,
    result: Result<crate::handler::Payload, HandlerError>,
) -> Response {
    match result {
        Ok(payload) => match content_format::ContentFormat::from_u16(payload.content_format) {
            Some(format) => payload_response(response_type, request, success, &payload.data, format),
            None => {
                coap_warn!("handler returned unrecognized content-format {}", payload.content_format);
                text_response(response_type, request, Status::InternalServerError, "Internal Server Error")
            }
        },
        Err(HandlerError::NotFound) => text_response(response_type, request, Status::NotFound, "Not Found"),
        Err(other) => {
            coap_warn!("handler failed: {}", other);
            text_response(response_type, request, Status::InternalServerError, "Internal Server Error")
        }
    }
}

/// Encodes `data` per `format` and builds the response. A response with no
/// payload carries no `0xFF` marker and no Content-Format option: per §4.5,
/// the marker only exists to separate options from a *non-empty* payload,
/// and emitting it with nothing behind it is a framing error this codec's
/// own decoder rejects.
fn payload_response(
    response_type: MessageType,
    request: &Request,
    status: Status,
    data: &content_format::PayloadData,
    format: content_format::ContentFormat,
) -> Response {
    match content_format::encode(data, format) {
        Ok(bytes) if !bytes.is_empty() => Response {
            message_type: response_type,
            status,
            message_id: request.message_id,
            token: request.token.clone(),
            payload: Some(bytes),
            content_format: Some(format.to_u16()),
        },
        Ok(_) => Response {
            message_type: response_type,
            status,
            message_id: request.message_id,
            token: request.token.clone(),
            payload: None,
            content_format: None,
        },
        Err(e) => {
            coap_warn!("content-format encoding failed: {}", e);
            text_response(response_type, request, Status::InternalServerError, "Internal Server Error")
        }
    }
}

fn text_response(response_type: MessageType, request: &Request, status: Status, body: &str) -> Response {
    Response {
        message_type: response_type,
        status,
        message_id: request.message_id,
        token: request.token.clone(),
        payload: Some(body.as_bytes().to_vec()),
        content_format: Some(0),
    }
}

fn parse_query<'a>(pairs: impl Iterator<Item = &'a str>) -> BTreeMap<String, String> {
    let mut query = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((name, value)) => {
                query.insert(name.into(), value.into());
            }
            None => {
                query.insert(pair.into(), String::new());
            }
        }
    }
    query
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{handler::Payload, message::deserialize, message::Envelope, resource::Resource};

    fn request_from(bytes: &[u8]) -> Request {
        match deserialize(bytes).unwrap() {
            Envelope::Request(r) => r,
            Envelope::Empty { .. } => panic!("expected a request"),
        }
    }

    #[test]
    fn get_unknown_path_is_not_found() {
        let registry = Registry::new();
        let req = request_from(&[0x40, 0x01, 0x00, 0x01, 0xB7, b'm', b'i', b's', b's', b'i', b'n', b'g']);
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::NotFound, response.status);
        assert_eq!(MessageType::Acknowledgement, response.message_type);
    }

    #[test]
    fn get_hi_returns_content() {
        let mut registry = Registry::new();
        registry.add(
            Resource::new("hi").with_get(alloc::boxed::Box::new(|_: &HandlerParams| Ok(Payload::text("ok")))),
        );
        let req = request_from(&[0x40, 0x01, 0x00, 0x01, 0xB2, b'h', b'i']);
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::Content, response.status);
        assert_eq!(Some(b"ok".to_vec()), response.payload);
    }

    #[test]
    fn well_known_core_returns_discovery_payload() {
        let mut registry = Registry::new();
        registry.add(Resource::new("temp").with_resource_type("temperature"));
        let bytes = [
            0x40, 0x01, 0x00, 0x01, 0xBB, b'.', b'w', b'e', b'l', b'l', b'-', b'k', b'n', b'o',
            b'w', b'n', 0x04, b'c', b'o', b'r', b'e',
        ];
        let req = request_from(&bytes);
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::Content, response.status);
        assert_eq!(Some(40), response.content_format);
        assert_eq!(
            Some(br#"<temp>;rt="temperature""#.to_vec()),
            response.payload
        );
    }

    #[test]
    fn empty_handler_payload_omits_marker_and_content_format() {
        let mut registry = Registry::new();
        registry.add(
            Resource::new("hi")
                .with_put(alloc::boxed::Box::new(|_: &HandlerParams| Ok(Payload::text("")))),
        );
        let req = Request {
            message_type: MessageType::Confirmable,
            method: Method::Put,
            message_id: 1,
            token: Vec::new(),
            options: alloc::vec![crate::option::MessageOption {
                number: crate::option::CoapOption::UriPath.number(),
                value: crate::option::OptionValue::String("hi".into()),
            }],
            payload: None,
        };
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::Created, response.status);
        assert_eq!(None, response.payload);
        assert_eq!(None, response.content_format);
    }

    #[test]
    fn put_without_handler_reports_success_with_not_implemented_body() {
        let mut registry = Registry::new();
        registry.add(Resource::new("hi"));
        let req = Request {
            message_type: MessageType::Confirmable,
            method: Method::Put,
            message_id: 1,
            token: Vec::new(),
            options: alloc::vec![crate::option::MessageOption {
                number: crate::option::CoapOption::UriPath.number(),
                value: crate::option::OptionValue::String("hi".into()),
            }],
            payload: None,
        };
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::Created, response.status);
        assert_eq!(Some(b"Not Implemented".to_vec()), response.payload);
    }

    #[test]
    fn post_is_not_implemented() {
        let registry = Registry::new();
        let req = Request {
            message_type: MessageType::Confirmable,
            method: Method::Post,
            message_id: 1,
            token: Vec::new(),
            options: alloc::vec![crate::option::MessageOption {
                number: crate::option::CoapOption::UriPath.number(),
                value: crate::option::OptionValue::String("anything".into()),
            }],
            payload: None,
        };
        let response = dispatch(&req, &registry).unwrap();
        assert_eq!(Status::NotImplemented, response.status);
    }

    #[test]
    fn ack_gets_no_response() {
        let registry = Registry::new();
        let req = Request {
            message_type: MessageType::Acknowledgement,
            method: Method::Get,
            message_id: 1,
            token: Vec::new(),
            options: Vec::new(),
            payload: None,
        };
        assert!(dispatch(&req, &registry).is_none());
    }
}
