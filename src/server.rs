//! The single-threaded receive loop: bind a UDP socket, and for every
//! datagram, deserialize, dispatch, serialize, send.
//!
//! Grounded on the teacher crate's own `examples/server.rs` (bind, loop
//! `recv_from`/`send_to`) and the original Python reference's
//! `CoapServer.loop`, but unlike either of those this loop must not die on
//! one malformed datagram, so parse/serialize failures are logged and
//! skipped rather than unwrapped.

use std::net::UdpSocket;

use crate::{error::CoapError, message, resource::Registry};

/// The minimum receive buffer RFC 7252 implementers are expected to support.
pub const MIN_BUFFER_SIZE: usize = 1152;

/// Bind address and receive buffer size for [`Server::run`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            bind_address: "0.0.0.0:5683".into(),
            buffer_size: MIN_BUFFER_SIZE,
        }
    }
}

/// Owns the bound socket and the resource registry it dispatches against.
pub struct Server {
    socket: UdpSocket,
    buffer_size: usize,
    registry: Registry,
}

impl Server {
    /// Binds a UDP socket per `config` and takes ownership of `registry`.
    pub fn bind(config: ServerConfig, registry: Registry) -> std::io::Result<Server> {
        let socket = UdpSocket::bind(&config.bind_address)?;
        coap_info!("listening on {}", config.bind_address);
        Ok(Server {
            socket,
            buffer_size: config.buffer_size,
            registry,
        })
    }

    /// Runs the receive loop forever, handling one datagram per turn.
    /// Returns only if the socket itself errors.
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf)?;
            self.handle_datagram(&buf[..len], peer);
        }
    }

    /// Processes one datagram: deserialize, dispatch, serialize, send.
    /// Any failure is logged and the datagram is dropped; the loop itself
    /// never aborts because of one bad peer.
    fn handle_datagram(&self, bytes: &[u8], peer: std::net::SocketAddr) {
        let envelope = match message::deserialize(bytes) {
            Ok(envelope) => envelope,
            Err(CoapError::BadOption(ctx)) => {
                coap_warn!("rejecting option {} from {}", ctx.number, peer);
                if let Some(message_type) = message::response_type_for(ctx.message_type) {
                    let response = crate::message::Response {
                        message_type,
                        status: crate::header::Status::BadOption,
                        message_id: ctx.message_id,
                        token: ctx.token,
                        payload: None,
                        content_format: None,
                    };
                    self.send(&response, peer);
                }
                return;
            }
            Err(e) => {
                coap_warn!("dropping malformed datagram from {}: {}", peer, e);
                return;
            }
        };

        let request = match envelope {
            message::Envelope::Empty { .. } => {
                coap_debug!("dropping empty message from {}", peer);
                return;
            }
            message::Envelope::Request(request) => request,
        };

        match crate::dispatch::dispatch(&request, &self.registry) {
            Some(response) => self.send(&response, peer),
            None => coap_debug!("no response owed to {} (ack/reset)", peer),
        }
    }

    fn send(&self, response: &message::Response, peer: std::net::SocketAddr) {
        match message::serialize(response) {
            Ok(bytes) => {
                if let Err(e) = self.socket.send_to(&bytes, peer) {
                    coap_warn!("failed to send response to {}: {}", peer, e);
                }
            }
            Err(e) => coap_warn!("failed to serialize response for {}: {}", peer, e),
        }
    }
}
