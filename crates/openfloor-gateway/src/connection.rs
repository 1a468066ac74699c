//! One task per client connection.
//!
//! The actor owns the WebSocket, its `Session`, and the receiving end of
//! its outbound broadcast queue. Requests are processed strictly one at
//! a time, so every response is trivially matched to its request id;
//! broadcasts arriving mid-request queue up and flush between requests.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use openfloor_types::{BitcoinApi, ConnectionId, Session};
use openfloor_wire::{FrameOutcome, read_frame};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use tracing::{debug, error, warn};

use crate::dispatch::Dispatcher;
use crate::hub::GatewayHub;

/// Owns one client socket from accept to teardown.
pub struct ConnectionActor {
    id: ConnectionId,
    dispatcher: Arc<Dispatcher>,
    hub: Arc<GatewayHub>,
    bitcoin: Arc<dyn BitcoinApi>,
    outbound_queue: usize,
}

impl ConnectionActor {
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        hub: Arc<GatewayHub>,
        bitcoin: Arc<dyn BitcoinApi>,
        outbound_queue: usize,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            dispatcher,
            hub,
            bitcoin,
            outbound_queue,
        }
    }

    /// Perform the WebSocket handshake and run the connection to
    /// completion. Consumes the actor; deregisters itself on exit.
    pub async fn run(self, stream: TcpStream) {
        let websocket = match accept_async(stream).await {
            Ok(websocket) => websocket,
            Err(err) => {
                warn!(conn = %self.id.short(), %err, "websocket handshake failed");
                return;
            }
        };
        self.drive(websocket).await;
    }

    async fn drive(self, websocket: WebSocketStream<TcpStream>) {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(self.outbound_queue);
        self.hub.register(self.id, outbound_tx);

        let (mut sink, mut stream) = websocket.split();
        let mut session = Session::new();

        loop {
            tokio::select! {
                inbound = stream.next() => {
                    let message = match inbound {
                        Some(Ok(message)) => message,
                        Some(Err(err)) => {
                            debug!(conn = %self.id.short(), %err, "transport error");
                            break;
                        }
                        None => {
                            debug!(conn = %self.id.short(), "transport closed");
                            break;
                        }
                    };
                    match message {
                        Message::Text(text) => {
                            if !self.handle_frame(text.as_str(), &mut session, &mut sink).await {
                                break;
                            }
                        }
                        Message::Binary(_) => {
                            warn!(conn = %self.id.short(), "discarded binary frame");
                        }
                        Message::Close(_) => break,
                        // Pings are answered by the transport layer.
                        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                    }
                }
                outbound = outbound_rx.recv() => {
                    let Some(text) = outbound else { break };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.hub.deregister(&self.id);
    }

    /// Decode and process one inbound text frame. Returns `false` when
    /// the connection must be torn down.
    async fn handle_frame<S>(&self, raw: &str, session: &mut Session, sink: &mut S) -> bool
    where
        S: futures_util::Sink<Message> + Unpin,
    {
        let request = match read_frame(raw, session, self.bitcoin.as_ref()) {
            FrameOutcome::Request(request) => request,
            FrameOutcome::Discard(reason) => {
                // Reject without a response: nothing parseable to
                // correlate a reply to.
                warn!(conn = %self.id.short(), %reason, "discarded frame");
                return true;
            }
        };

        let response = match self.dispatcher.dispatch(request, session).await {
            Ok(response) => response,
            Err(err) => {
                error!(conn = %self.id.short(), %err, "request processing failed; closing connection");
                return false;
            }
        };

        let text = match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(err) => {
                error!(conn = %self.id.short(), %err, "failed to serialize response");
                return false;
            }
        };

        sink.send(Message::Text(text.into())).await.is_ok()
    }
}
