//! Server-Sent Events parsing for streamed LLM responses.
//!
//! Network chunks are buffered as raw bytes and only decoded once a whole
//! line is available, so a multi-byte character split across two chunks is
//! decoded intact. Lines are assembled into events at blank lines; only the
//! `event:` and `data:` fields are kept (`id:` and `retry:` matter for
//! reconnection, which the providers never attempt).

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

/// One assembled SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

/// Stream adapter from a byte stream to SSE events.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    event: Option<String>,
    done: bool,
}

impl<S> SseStream<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            data_lines: Vec::new(),
            event: None,
            done: false,
        }
    }

    /// Pop the next complete line off the buffer, without its line ending.
    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Apply one line; returns an event when the line completes one.
    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take_event();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() && self.event.is_none() {
            return None;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(SseEvent {
            event: self.event.take(),
            data,
        })
    }
}

impl<S, B, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<SseEvent, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            while let Some(line) = this.next_line() {
                if let Some(event) = this.process_line(&line) {
                    return Poll::Ready(Some(Ok(event)));
                }
            }

            if this.done {
                // Emit a trailing event that had no blank line after it.
                return Poll::Ready(this.take_event().map(Ok));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(chunk.as_ref()),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    this.done = true;
                    if !this.buffer.is_empty() {
                        this.buffer.push(b'\n');
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
