//! One stream, from first fragment to final flush.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::accumulator::Accumulator;
use crate::config::FrameConfig;
use crate::delivery::DeliveryQueue;
use crate::error::FrameError;
use crate::pacing::PacedScheduler;
use crate::sink::Sink;
use crate::splitter::FrameSplitter;

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Frames formed by the splitter.
    pub frames: usize,
    pub sends: usize,
    pub edits: usize,
    pub replies: usize,
    pub skipped_edits: usize,
    /// Sink calls that returned an error.
    pub failed_calls: usize,
    /// Frames given up on during the final flush.
    pub dropped_frames: usize,
    /// Error text of a fragment source that ended early.
    pub source_error: Option<String>,
}

impl StreamSummary {
    /// Total successful sink calls.
    #[must_use]
    pub fn sink_calls(&self) -> usize {
        self.sends + self.edits + self.replies
    }
}

/// Owns all framing state for one stream and the sink it writes to.
///
/// Drive it either with [`run`](Self::run), which consumes a fragment
/// stream, or manually with [`push`](Self::push) and
/// [`finish`](Self::finish).
pub struct StreamSession<S: Sink> {
    sink: S,
    accumulator: Accumulator,
    splitter: FrameSplitter,
    scheduler: PacedScheduler,
    delivery: DeliveryQueue<S::Handle>,
    /// Tag of a fence the next frame must re-open.
    fence: Option<String>,
    frames: usize,
    failed_calls: usize,
    dropped_frames: usize,
}

impl<S: Sink> StreamSession<S> {
    pub fn new(config: FrameConfig, sink: S) -> Result<Self, FrameError> {
        config.validate()?;
        Ok(Self {
            sink,
            accumulator: Accumulator::new(&config),
            splitter: FrameSplitter::new(&config),
            scheduler: PacedScheduler::new(config.flush_interval),
            delivery: DeliveryQueue::new(config.max_frame_length),
            fence: None,
            frames: 0,
            failed_calls: 0,
            dropped_frames: 0,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Content last confirmed on the open sink message.
    pub fn open_content(&self) -> &str {
        self.delivery.open_content()
    }

    /// Consume a fragment source until it ends, then flush everything.
    ///
    /// A source error ends the stream like normal completion; its text is
    /// reported in the summary. Only an allocation failure is returned as an
    /// error, and no further sink calls are made in that case.
    pub async fn run<St, E>(mut self, mut source: St) -> Result<StreamSummary, FrameError>
    where
        St: Stream<Item = Result<String, E>> + Unpin,
        E: Display,
    {
        let mut source_error = None;
        while let Some(item) = source.next().await {
            match item {
                Ok(fragment) => self.push(&fragment, Instant::now()).await?,
                Err(e) => {
                    warn!(error = %e, "Fragment source failed, flushing partial output");
                    source_error = Some(e.to_string());
                    break;
                }
            }
        }

        let mut summary = self.finish().await;
        summary.source_error = source_error;
        Ok(summary)
    }

    /// Buffer a fragment that arrived at `now` and flush if due.
    pub async fn push(&mut self, fragment: &str, now: Instant) -> Result<(), FrameError> {
        self.accumulator.append(fragment)?;
        self.tick(now).await;
        Ok(())
    }

    /// Flush as many times as the pacing interval allows at `now`.
    pub async fn tick(&mut self, now: Instant) {
        while self.has_pending() && self.scheduler.is_due(now) {
            self.form_frame();
            let result = self.delivery.flush_one(&self.sink).await;
            self.scheduler.record_flush(now);
            if let Err(e) = result {
                self.failed_calls += 1;
                warn!(op = %e.op, error = %e.message, "Sink call failed, retrying on next flush");
                break;
            }
        }

        if !self.has_pending() {
            self.scheduler.settle(now);
        }
    }

    /// Final unconditional flush: drain the carryover and every pending
    /// frame regardless of pacing.
    pub async fn finish(mut self) -> StreamSummary {
        self.accumulator.finish();
        while self.form_frame() {}

        while self.delivery.has_pending() {
            if let Err(e) = self.delivery.flush_one(&self.sink).await {
                self.failed_calls += 1;
                self.dropped_frames += 1;
                self.delivery.discard_front();
                warn!(op = %e.op, error = %e.message, "Sink call failed during final flush, dropping frame");
            }
        }

        let stats = self.delivery.stats();
        let summary = StreamSummary {
            frames: self.frames,
            sends: stats.sends,
            edits: stats.edits,
            replies: stats.replies,
            skipped_edits: stats.skipped_edits,
            failed_calls: self.failed_calls,
            dropped_frames: self.dropped_frames,
            source_error: None,
        };
        debug!(
            frames = summary.frames,
            sink_calls = summary.sink_calls(),
            failed = summary.failed_calls,
            "Stream session finished"
        );
        summary
    }

    fn has_pending(&self) -> bool {
        !self.accumulator.ready_lines().is_empty() || self.delivery.has_pending()
    }

    /// Split one frame off the ready lines into the delivery queue.
    fn form_frame(&mut self) -> bool {
        match self
            .splitter
            .split(self.accumulator.ready_lines_mut(), &mut self.fence)
        {
            Some(frame) => {
                self.frames += 1;
                self.delivery.enqueue(frame);
                true
            }
            None => false,
        }
    }
}
