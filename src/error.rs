use std::io;
use std::process::ExitStatus;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures that end a streaming run.
///
/// Write failures on an open connection and a failed close frame are not
/// listed here: they are logged where they happen and the run carries on.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("failed to start \"{program}\": {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("command exited unsuccessfully: {0}")]
    CommandFailed(ExitStatus),

    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),

    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("interrupted while connecting")]
    Interrupted,
}
