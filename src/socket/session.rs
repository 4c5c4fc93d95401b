use flume::Receiver;

/// Why the forwarding loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardOutcome {
    /// The command's output ran out.
    #[default]
    Exhausted,
    /// Writing a frame to the connection failed.
    WriteFailed,
    /// An interrupt arrived before the output ran out.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamReport {
    /// Text frames accepted by the connection.
    pub lines_sent: usize,
    pub outcome: ForwardOutcome,
}

impl StreamReport {
    pub(super) fn finish(mut self, outcome: ForwardOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Resolves when an interrupt is signalled. A disconnected signal source
/// never resolves, so dropping every sender means "no interrupt".
pub(crate) async fn interrupted(interrupt: &Receiver<()>) {
    if interrupt.recv_async().await.is_err() {
        std::future::pending::<()>().await;
    }
}
