//! In-memory `FrameSink` doubles shared by the application layer tests.

use std::sync::{Arc, Mutex};

use crate::domain::foundation::UserId;
use crate::ports::{CloseReason, FrameSink, SinkError};

use super::registry::ConnectionHandle;

/// Records everything written through a sink.
pub(crate) struct SinkLog {
    sent: Mutex<Vec<String>>,
    closes: Mutex<Vec<CloseReason>>,
}

impl SinkLog {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn closes(&self) -> Vec<CloseReason> {
        self.closes.lock().unwrap().clone()
    }
}

/// `FrameSink` that appends to a shared log.
pub(crate) struct RecordingSink(pub(crate) Arc<SinkLog>);

impl FrameSink for RecordingSink {
    fn send_text(&self, text: String) -> Result<(), SinkError> {
        self.0.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self, reason: CloseReason) -> Result<(), SinkError> {
        self.0.closes.lock().unwrap().push(reason);
        Ok(())
    }
}

/// `FrameSink` whose writes always fail with a transport error.
pub(crate) struct FailingSink;

impl FrameSink for FailingSink {
    fn send_text(&self, _text: String) -> Result<(), SinkError> {
        Err(SinkError::Transport("wire broke".to_string()))
    }

    fn close(&self, _reason: CloseReason) -> Result<(), SinkError> {
        Err(SinkError::Transport("wire broke".to_string()))
    }
}

/// Open handle backed by a recording sink, with access to the log.
pub(crate) fn recording_handle(user: &str) -> (Arc<ConnectionHandle>, Arc<SinkLog>) {
    let log = SinkLog::new();
    let handle = ConnectionHandle::new(
        UserId::new(user).unwrap(),
        Box::new(RecordingSink(log.clone())),
    );
    (handle, log)
}

/// Open handle for tests that do not inspect output.
pub(crate) fn open_handle(user: &str) -> Arc<ConnectionHandle> {
    recording_handle(user).0
}

/// Open handle whose sink always fails.
pub(crate) fn failing_handle(user: &str) -> Arc<ConnectionHandle> {
    ConnectionHandle::new(UserId::new(user).unwrap(), Box::new(FailingSink))
}
