//! Live output stream sessions.
//!
//! A session owns one websocket connection. A spawned reader worker decodes
//! inbound envelopes, drops keep-alives, and forwards data messages through
//! a bounded channel in arrival order, so slow consumers backpressure the
//! socket instead of growing a queue. [`OutputStream::recv`] parks on that
//! channel; [`StreamCloser`] cancels the worker from any task.

use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::client::{Client, API_TOKEN_HEADER};
use crate::stream::proto::{Envelope, OutputDataMessage};

/// Inbound messages buffered between the reader worker and `recv`.
const INBOUND_BUFFER: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl Client {
    /// Opens a stream of messages from all devices in a collection.
    ///
    /// Blocks until the websocket handshake completes; a rejected handshake
    /// (bad token, unknown collection) fails here, not on the first `recv`.
    pub async fn collection_stream(&self, collection_id: &str) -> Result<OutputStream, StreamError> {
        self.output_stream(&format!("/collections/{collection_id}"))
            .await
    }

    /// Opens a stream of messages from one device.
    pub async fn device_stream(
        &self,
        collection_id: &str,
        device_id: &str,
    ) -> Result<OutputStream, StreamError> {
        self.output_stream(&format!("/collections/{collection_id}/devices/{device_id}"))
            .await
    }

    async fn output_stream(&self, path: &str) -> Result<OutputStream, StreamError> {
        let url = stream_url(self.addr(), path)?;
        let mut request = url.as_str().into_client_request()?;
        let token_header = self.token().expose_secret().parse()?;
        request.headers_mut().insert(API_TOKEN_HEADER, token_header);

        let (socket, _response) = connect_async(request).await?;
        debug!(event = "stream_opened", path);

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        tokio::spawn(stream_reader(socket, inbound_tx, cancel.clone()));

        Ok(OutputStream {
            inbound: inbound_rx,
            closer: StreamCloser { cancel },
        })
    }
}

/// An open stream of device messages.
///
/// The connection has exactly one reader: `recv` takes `&mut self`, so two
/// tasks cannot interleave reads. To shut the session down from another
/// task, hand it a [`StreamCloser`] from [`OutputStream::closer`].
#[derive(Debug)]
pub struct OutputStream {
    inbound: mpsc::Receiver<Result<OutputDataMessage, StreamError>>,
    closer: StreamCloser,
}

impl OutputStream {
    /// Blocks until the next device message arrives.
    ///
    /// Keep-alive frames are absorbed internally and never surface here;
    /// data messages come out in the exact order they were received. Any
    /// returned error is terminal for the session: [`StreamError::ServerClosed`]
    /// when the server closed the stream cleanly (reconnect by opening a new
    /// session), [`StreamError::Closed`] after a local close, and websocket
    /// or JSON errors otherwise. Calling `recv` again after an error yields
    /// [`StreamError::Closed`].
    pub async fn recv(&mut self) -> Result<OutputDataMessage, StreamError> {
        match self.inbound.recv().await {
            Some(Ok(message)) => Ok(message),
            Some(Err(err)) => Err(err),
            None => Err(StreamError::Closed),
        }
    }

    /// Closes the stream.
    ///
    /// Idempotent; a `recv` parked on the session unblocks with
    /// [`StreamError::Closed`].
    pub fn close(&self) {
        self.closer.close();
    }

    /// Returns a handle that can close this stream from another task.
    pub fn closer(&self) -> StreamCloser {
        self.closer.clone()
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.closer.close();
    }
}

/// Cloneable handle that shuts down an [`OutputStream`].
#[derive(Clone, Debug)]
pub struct StreamCloser {
    cancel: CancellationToken,
}

impl StreamCloser {
    /// Closes the associated stream. Safe to call any number of times.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Errors produced by stream setup and receive handling.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Websocket transport or handshake error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] WsError),

    /// The client's base address could not be parsed.
    #[error("invalid stream address: {0}")]
    Url(#[from] url::ParseError),

    /// The API token is not a valid HTTP header value.
    #[error("api token is not a valid header value")]
    InvalidToken(#[from] InvalidHeaderValue),

    /// An inbound frame was not a valid envelope.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stream contract violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server closed the stream cleanly.
    #[error("stream closed by server")]
    ServerClosed,

    /// The stream was closed on this side.
    #[error("stream closed")]
    Closed,
}

fn stream_url(addr: &str, path: &str) -> Result<Url, StreamError> {
    let mut url = Url::parse(addr)?;
    let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
    url.set_scheme(scheme).map_err(|()| {
        StreamError::Protocol(format!("cannot derive a websocket scheme from {addr}"))
    })?;
    url.set_path(&format!("{path}/from"));
    Ok(url)
}

async fn stream_reader(
    mut socket: WsStream,
    inbound: mpsc::Sender<Result<OutputDataMessage, StreamError>>,
    cancel: CancellationToken,
) {
    let terminal = read_frames(&mut socket, &inbound, &cancel).await;
    debug!(event = "stream_reader_finished", terminal = %terminal);
    let _ = socket.close(None).await;
    let _ = inbound.send(Err(terminal)).await;
}

async fn read_frames(
    socket: &mut WsStream,
    inbound: &mpsc::Sender<Result<OutputDataMessage, StreamError>>,
    cancel: &CancellationToken,
) -> StreamError {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return StreamError::Closed,
            frame = socket.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Some(terminal) =
                    deliver(serde_json::from_str(&text), inbound, cancel).await
                {
                    return terminal;
                }
            }
            Some(Ok(Message::Binary(data))) => {
                if let Some(terminal) =
                    deliver(serde_json::from_slice(&data), inbound, cancel).await
                {
                    return terminal;
                }
            }
            Some(Ok(Message::Ping(payload))) => {
                if let Err(err) = socket.send(Message::Pong(payload)).await {
                    return terminal_from_ws(err);
                }
            }
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(_))) | None => return StreamError::ServerClosed,
            Some(Err(err)) => return terminal_from_ws(err),
        }
    }
}

/// Forwards a decoded data frame to the session, dropping keep-alives.
/// Returns the terminal error once the session is going away.
async fn deliver(
    parsed: Result<Envelope, serde_json::Error>,
    inbound: &mpsc::Sender<Result<OutputDataMessage, StreamError>>,
    cancel: &CancellationToken,
) -> Option<StreamError> {
    let envelope = match parsed {
        Ok(envelope) => envelope,
        Err(err) => return Some(StreamError::Json(err)),
    };

    if envelope.is_keep_alive() {
        trace!(event = "keepalive_discarded");
        return None;
    }

    tokio::select! {
        _ = cancel.cancelled() => Some(StreamError::Closed),
        sent = inbound.send(Ok(envelope.into_message())) => match sent {
            Ok(()) => None,
            // Receiver dropped; the session is already gone.
            Err(_) => Some(StreamError::Closed),
        },
    }
}

fn terminal_from_ws(err: WsError) -> StreamError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => StreamError::ServerClosed,
        err => StreamError::WebSocket(err),
    }
}
