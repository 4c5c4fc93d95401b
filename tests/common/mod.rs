use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use flume::{Receiver, Sender};
use tokio::net::TcpListener;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

use wscmd::Config;

/// A websocket server on a random local port.
///
/// `/echo` records every text frame and sends it back. `/silent` accepts the
/// upgrade and then never reads, so a client's close frame goes unanswered.
/// `/drop` records the first text frame and then drops the connection.
pub struct TestServer {
    pub addr: SocketAddr,
    pub received: Receiver<String>,
}

impl TestServer {
    pub async fn start() -> Self {
        let (tx, rx) = flume::unbounded();
        let app = Router::new()
            .route("/echo", get(echo_handler))
            .route("/silent", get(silent_handler))
            .route("/drop", get(drop_handler))
            .with_state(tx);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        TestServer { addr, received: rx }
    }

    pub fn config(&self, path: &str, cmd: &str) -> Config {
        Config {
            addr: self.addr.to_string(),
            path: path.to_string(),
            cmd: cmd.to_string(),
            log_level: "debug".to_string(),
        }
    }

    /// Waits for the next `n` frames the server has received.
    pub async fn take(&self, n: usize) -> Vec<String> {
        let mut frames = Vec::with_capacity(n);
        for _ in 0..n {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.received.recv_async())
                .await
                .expect("timed out waiting for a frame")
                .unwrap();
            frames.push(frame);
        }
        frames
    }
}

async fn echo_handler(ws: WebSocketUpgrade, State(tx): State<Sender<String>>) -> Response {
    ws.on_upgrade(move |socket| echo(socket, tx))
}

async fn echo(mut socket: WebSocket, tx: Sender<String>) {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let _ = tx.send(text.clone());
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Message::Close(frame) => {
                let _ = socket.send(Message::Close(frame)).await;
                break;
            }
            _ => {}
        }
    }
}

async fn silent_handler(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|socket| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    })
}

async fn drop_handler(ws: WebSocketUpgrade, State(tx): State<Sender<String>>) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        while let Some(Ok(msg)) = socket.recv().await {
            if let Message::Text(text) = msg {
                let _ = tx.send(text);
                break;
            }
        }
        drop(socket);
    })
}

/// Returns the address of a TCP listener that accepts connections but never
/// answers the websocket handshake.
pub async fn stalled_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// Returns a port nothing is listening on.
pub async fn closed_port_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// An interrupt source that never fires while the sender is held.
pub fn no_interrupt() -> (Sender<()>, Receiver<()>) {
    flume::bounded(1)
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        Dispatch::new(subscriber)
    }

    /// Messages of the INFO events logged so far.
    pub fn info_messages(&self) -> Vec<String> {
        self.messages("INFO")
    }

    /// Messages of the ERROR events logged so far.
    pub fn error_messages(&self) -> Vec<String> {
        self.messages("ERROR")
    }

    fn messages(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        let prefix = format!("{} ", level);
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix(prefix.as_str()))
            .map(String::from)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
