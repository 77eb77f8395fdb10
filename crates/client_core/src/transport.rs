//! Long-lived realtime connection shared by every room view of a session.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientRequest, ServerEvent};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header, HeaderValue},
        Message,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Named-event bus. Emission is fire-and-forget: failures are logged by the
/// implementation and never reported to the caller.
pub trait Transport: Send + Sync {
    fn emit(&self, request: ClientRequest);
    fn subscribe(&self) -> broadcast::Receiver<ServerEvent>;
}

pub struct WsTransport {
    outbound: mpsc::UnboundedSender<ClientRequest>,
    events: broadcast::Sender<ServerEvent>,
    connected: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

/// Maps `http(s)` to `ws(s)` and appends `socket_path`.
pub fn websocket_url(socket_url: &str, socket_path: &str) -> ClientResult<Url> {
    let mut url = Url::parse(socket_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| ClientError::UnsupportedScheme(url.scheme().to_string()))?;
    }
    let base = url.path().trim_end_matches('/');
    let path = format!("{base}/{}", socket_path.trim_start_matches('/'));
    url.set_path(&path);
    Ok(url)
}

impl WsTransport {
    /// Opens the socket. `cookie` is sent as the handshake's `Cookie` header
    /// so the server sees the same session as the REST API.
    pub async fn connect(
        socket_url: &str,
        socket_path: &str,
        event_buffer: usize,
        cookie: Option<&str>,
    ) -> ClientResult<Arc<Self>> {
        let ws_url = websocket_url(socket_url, socket_path)?;
        let mut request = ws_url
            .as_str()
            .into_client_request()
            .map_err(|err| ClientError::TransportConnect(format!("{ws_url}: {err}")))?;
        if let Some(cookie) = cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|err| ClientError::TransportConnect(format!("invalid cookie: {err}")))?;
            request.headers_mut().insert(header::COOKIE, value);
        }
        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|err| ClientError::TransportConnect(format!("{ws_url}: {err}")))?;
        info!(url = %ws_url, "transport: connected");
        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        let (events, _) = broadcast::channel(event_buffer.max(1));
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientRequest>();
        let connected = Arc::new(AtomicBool::new(true));

        let writer_connected = Arc::clone(&connected);
        let writer_task = tokio::spawn(async move {
            while let Some(request) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&request) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(event = request.event_name(), "transport: encode failed: {err}");
                        continue;
                    }
                };
                debug!(event = request.event_name(), "transport: emit");
                if let Err(err) = ws_writer.send(Message::Text(text)).await {
                    warn!(event = request.event_name(), "transport: send failed: {err}");
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
        });

        let reader_events = events.clone();
        let reader_connected = Arc::clone(&connected);
        let reader_task = tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            let _ = reader_events.send(event);
                        }
                        Err(err) => {
                            warn!("transport: dropping unrecognized frame: {err}");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("transport: receive failed: {err}");
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            info!("transport: connection closed");
        });

        Ok(Arc::new(Self {
            outbound,
            events,
            connected,
            reader_task,
            writer_task,
        }))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Transport for WsTransport {
    fn emit(&self, request: ClientRequest) {
        let event = request.event_name();
        if self.outbound.send(request).is_err() {
            warn!(event, "transport: emit after connection closed");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
