//! In-memory sink for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::SinkError;
use crate::sink::{Sink, SinkOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(String),
    Edit(usize, String),
    Reply(usize, String),
}

impl Call {
    pub fn content(&self) -> &str {
        match self {
            Call::Send(c) | Call::Edit(_, c) | Call::Reply(_, c) => c,
        }
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<(Instant, Call)>,
    /// Current content of every message, indexed by handle.
    messages: Vec<String>,
    fail_next: Vec<SinkOp>,
    report_unchanged: bool,
}

/// Records successful calls; handles are message indices.
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().map(|(t, _)| *t).collect()
    }

    /// Final content of every message, in creation order.
    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().unwrap().messages.clone()
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: SinkOp) {
        self.inner.lock().unwrap().fail_next.push(op);
    }

    /// Make every edit report "unchanged".
    pub fn report_unchanged(&self, unchanged: bool) {
        self.inner.lock().unwrap().report_unchanged = unchanged;
    }

    fn check_failure(inner: &mut Inner, op: SinkOp) -> Result<(), SinkError> {
        if let Some(pos) = inner.fail_next.iter().position(|o| *o == op) {
            inner.fail_next.remove(pos);
            return Err(SinkError::new(op, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for RecordingSink {
    type Handle = usize;

    async fn send(&self, content: &str) -> Result<usize, SinkError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner, SinkOp::Send)?;
        inner.messages.push(content.to_string());
        inner
            .calls
            .push((Instant::now(), Call::Send(content.to_string())));
        Ok(inner.messages.len() - 1)
    }

    async fn edit(&self, handle: &usize, content: &str) -> Result<bool, SinkError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner, SinkOp::Edit)?;
        inner
            .calls
            .push((Instant::now(), Call::Edit(*handle, content.to_string())));
        if inner.report_unchanged || inner.messages[*handle] == content {
            return Ok(false);
        }
        inner.messages[*handle] = content.to_string();
        Ok(true)
    }

    async fn reply(&self, handle: &usize, content: &str) -> Result<usize, SinkError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_failure(&mut inner, SinkOp::Reply)?;
        inner.messages.push(content.to_string());
        inner
            .calls
            .push((Instant::now(), Call::Reply(*handle, content.to_string())));
        Ok(inner.messages.len() - 1)
    }
}
