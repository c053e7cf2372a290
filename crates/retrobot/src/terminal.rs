//! A sink that prints frames to a terminal, for `retrobot ask`.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use retrobot_frames::{Sink, SinkError, SinkOp};

/// Writes every sink call as a labelled block.
///
/// Handles are message numbers starting at 1.
pub struct TerminalSink<W> {
    out: Mutex<W>,
    next_id: AtomicUsize,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_block(&self, op: SinkOp, header: &str, content: &str) -> Result<(), SinkError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| SinkError::new(op, "terminal writer poisoned"))?;
        writeln!(out, "--- {header} ---")
            .and_then(|()| writeln!(out, "{content}"))
            .and_then(|()| out.flush())
            .map_err(|e| SinkError::new(op, e.to_string()))
    }
}

#[async_trait]
impl<W: Write + Send> Sink for TerminalSink<W> {
    type Handle = usize;

    async fn send(&self, content: &str) -> Result<usize, SinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.write_block(SinkOp::Send, &format!("message {id}"), content)?;
        Ok(id)
    }

    async fn edit(&self, handle: &usize, content: &str) -> Result<bool, SinkError> {
        self.write_block(SinkOp::Edit, &format!("message {handle} (edited)"), content)?;
        Ok(true)
    }

    async fn reply(&self, handle: &usize, content: &str) -> Result<usize, SinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.write_block(
            SinkOp::Reply,
            &format!("message {id} (reply to {handle})"),
            content,
        )?;
        Ok(id)
    }
}
