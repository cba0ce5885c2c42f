use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Status emitted while a conversion runs, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Read { seq_no: u64 },
    Check { seq_no: u64 },
    Write { seq_no: u64 },
    EndOfFile,
    Failed { message: String },
}

impl StatusEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusEvent::EndOfFile | StatusEvent::Failed { .. })
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Read { seq_no } => write!(f, "Read CSV File : SeqNo={}", seq_no),
            StatusEvent::Check { seq_no } => write!(f, "Check lines : SeqNo={}", seq_no),
            StatusEvent::Write { seq_no } => write!(f, "Write SRT File : SeqNo={}", seq_no),
            StatusEvent::EndOfFile => write!(f, "End of file"),
            StatusEvent::Failed { message } => write!(f, "Failed : {}", message),
        }
    }
}

/// Fire-and-forget sender; a closed or missing receiver is ignored
#[derive(Debug, Clone, Default)]
pub struct StatusSender {
    tx: Option<UnboundedSender<StatusEvent>>,
}

impl StatusSender {
    pub fn new(tx: UnboundedSender<StatusEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sender that drops every event
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: StatusEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
