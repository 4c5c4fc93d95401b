use flume::Receiver;
use tracing::info;

use command::CommandLine;
use socket::{interrupted, StreamReport, WebSocketClient};

pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod socket;

pub use config::Config;
pub use error::StreamError;

/// Runs the configured command and streams its output to the configured endpoint.
///
/// The command is started before dialing, so a command that cannot start
/// never opens a connection. An interrupt during the dial abandons the
/// command and returns [`StreamError::Interrupted`].
pub async fn run(config: &Config, interrupt: Receiver<()>) -> Result<StreamReport, StreamError> {
    info!("Executing command \"{}\"", config.cmd);
    let output = CommandLine::parse(&config.cmd)?.spawn()?;

    let url = config.endpoint();
    info!("Connecting to: {}", url);
    let connected = tokio::select! {
        connected = WebSocketClient::connect(&url) => connected,
        _ = interrupted(&interrupt) => Err(StreamError::Interrupted),
    };
    match connected {
        Ok(client) => client.stream(output, interrupt).await,
        Err(err) => {
            output.abandon();
            Err(err)
        }
    }
}
