use std::time::Duration;

use flume::Receiver;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info};

use crate::command::CommandOutput;
use crate::error::StreamError;

pub(crate) use session::interrupted;
pub use session::{ForwardOutcome, StreamReport};

mod session;

/// Longest wait for the server to finish the close handshake.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketClient {
    socket: WsStream,
}

impl WebSocketClient {
    pub async fn connect(url: &str) -> Result<Self, StreamError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|source| StreamError::Connect {
                url: url.to_string(),
                source,
            })?;
        debug!("connected to {}, status {}", url, response.status());
        Ok(WebSocketClient { socket })
    }

    /// Sends every line of `output` as a text frame, then closes the connection.
    ///
    /// Inbound messages are logged by a background reader for the whole
    /// session. Forwarding stops early on a write failure or when `interrupt`
    /// yields; in both cases the command is abandoned. An interrupt while
    /// waiting for the command to exit also abandons it. An unsuccessful
    /// command exit is returned as an error without closing gracefully.
    pub async fn stream(
        self,
        output: CommandOutput,
        interrupt: Receiver<()>,
    ) -> Result<StreamReport, StreamError> {
        let (mut sink, stream) = self.socket.split();
        let mut reader = tokio::spawn(Self::receive_event_loop(stream).with_current_subscriber());

        let mut report = Self::sink_event_loop(&mut sink, output.lines(), &interrupt).await;
        match report.outcome {
            ForwardOutcome::Exhausted => {
                let command = output.abort_handle();
                tokio::select! {
                    finished = output.finish() => {
                        if let Err(err) = finished {
                            reader.abort();
                            return Err(err);
                        }
                    }
                    _ = interrupted(&interrupt) => {
                        info!("Interrupted");
                        command.abort();
                        report = report.finish(ForwardOutcome::Interrupted);
                    }
                }
            }
            ForwardOutcome::WriteFailed | ForwardOutcome::Interrupted => output.abandon(),
        }

        info!("Stopping...");
        let close = Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        if let Err(err) = sink.send(close).await {
            error!("{}", err);
        }

        tokio::select! {
            _ = &mut reader => {}
            _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
                debug!("server did not finish closing within {:?}", SHUTDOWN_GRACE);
            }
            _ = interrupted(&interrupt), if report.outcome != ForwardOutcome::Interrupted => {}
        }
        reader.abort();
        Ok(report)
    }

    async fn sink_event_loop(
        sink: &mut SplitSink<WsStream, Message>,
        lines: &Receiver<String>,
        interrupt: &Receiver<()>,
    ) -> StreamReport {
        let mut report = StreamReport::default();
        loop {
            let line = tokio::select! {
                line = lines.recv_async() => match line {
                    Ok(line) => line,
                    Err(_) => return report.finish(ForwardOutcome::Exhausted),
                },
                _ = interrupted(interrupt) => {
                    info!("Interrupted");
                    return report.finish(ForwardOutcome::Interrupted);
                }
            };
            if let Err(err) = sink.send(Message::text(line)).await {
                error!("{}", err);
                return report.finish(ForwardOutcome::WriteFailed);
            }
            report.lines_sent += 1;
        }
    }

    /// Logs every inbound data message until the connection closes or fails.
    async fn receive_event_loop(mut receiver: SplitStream<WsStream>) {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => info!("{}", text.as_str()),
                Ok(Message::Binary(data)) => info!("{}", String::from_utf8_lossy(&data)),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    debug!("connection read ended: {}", err);
                    break;
                }
            }
        }
    }
}
