use std::process::ExitCode;

use tracing::instrument::WithSubscriber;
use tracing::{debug, error};

use wscmd::{logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_args(std::env::args_os());
    let dispatch = logging::dispatch(&config.log_level)?;

    let (interrupt_tx, interrupt_rx) = flume::bounded(1);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_tx.send_async(()).await.is_err() {
                break;
            }
        }
    });

    let code = async {
        match wscmd::run(&config, interrupt_rx).await {
            Ok(report) => {
                debug!("sent {} lines, {:?}", report.lines_sent, report.outcome);
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("{}", err);
                ExitCode::FAILURE
            }
        }
    }
    .with_subscriber(dispatch)
    .await;
    Ok(code)
}
