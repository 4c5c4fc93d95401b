use flume::Sender;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tracing::{debug, warn};

use crate::error::StreamError;

/// Forwards each stdout line through `tx`, then waits for the process.
///
/// Dropping `tx` closes the conduit before the wait, so the consumer sees the
/// end of output even while the process is still shutting down.
pub(super) async fn scan_lines(
    mut child: Child,
    stdout: ChildStdout,
    tx: Sender<String>,
) -> Result<(), StreamError> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send_async(decode_line(&buf)).await.is_err() {
                    debug!("line consumer went away, abandoning command");
                    return Ok(());
                }
            }
            Err(err) => {
                warn!("reading command output failed: {}", err);
                break;
            }
        }
    }
    drop(tx);

    let status = child.wait().await.map_err(StreamError::Wait)?;
    if status.success() {
        Ok(())
    } else {
        Err(StreamError::CommandFailed(status))
    }
}

/// Strips the line terminator (`\n` or `\r\n`) and replaces invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
