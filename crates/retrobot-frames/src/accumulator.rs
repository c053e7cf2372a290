//! Line accumulation from arbitrarily sized fragments.

use std::collections::VecDeque;

use crate::char_len;
use crate::config::FrameConfig;
use crate::error::FrameError;
use crate::fence::FenceTracker;
use crate::splitter::cut_point;

/// Collects fragments into completed lines.
///
/// Fragments carry no framing guarantees: they may end mid-word, mid-line or
/// mid-fence. Completed lines queue up in `ready_lines`; the unterminated
/// tail waits in `carryover` for the next fragment.
#[derive(Debug)]
pub struct Accumulator {
    carryover: String,
    ready_lines: VecDeque<String>,
    /// Fence state of the input seen so far, used to keep blank lines that
    /// belong to code blocks.
    fence: FenceTracker,
    prewrap_width: Option<usize>,
    word_window: usize,
}

impl Accumulator {
    #[must_use]
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            carryover: String::new(),
            ready_lines: VecDeque::new(),
            fence: FenceTracker::new(),
            prewrap_width: config.effective_prewrap_width(),
            word_window: config.word_window,
        }
    }

    /// Append a fragment and move every completed line to the ready queue.
    pub fn append(&mut self, fragment: &str) -> Result<(), FrameError> {
        self.carryover.try_reserve(fragment.len())?;
        self.carryover.push_str(fragment);

        if let Some(last_newline) = self.carryover.rfind('\n') {
            let rest = self.carryover.split_off(last_newline + 1);
            let completed = std::mem::replace(&mut self.carryover, rest);
            for line in completed[..last_newline].split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                self.push_line(line.to_string());
            }
        }

        self.prewrap();
        Ok(())
    }

    /// Treat the remaining carryover as a final line.
    pub fn finish(&mut self) {
        if !self.carryover.is_empty() {
            let line = std::mem::take(&mut self.carryover);
            self.push_line(line);
        }
    }

    #[must_use]
    pub fn carryover(&self) -> &str {
        &self.carryover
    }

    #[must_use]
    pub fn ready_lines(&self) -> &VecDeque<String> {
        &self.ready_lines
    }

    pub fn ready_lines_mut(&mut self) -> &mut VecDeque<String> {
        &mut self.ready_lines
    }

    /// Whether the input so far leaves a code fence open.
    #[must_use]
    pub fn in_fence(&self) -> bool {
        self.fence.is_open()
    }

    /// No completed lines and no carryover.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.ready_lines.is_empty() && self.carryover.is_empty()
    }

    fn push_line(&mut self, line: String) {
        let in_fence = self.fence.is_open();
        self.fence.observe(&line);
        if !in_fence && !self.fence.is_open() && line.trim().is_empty() {
            return;
        }
        self.ready_lines.push_back(line);
    }

    /// Wrap an unterminated line that has grown too long for any frame.
    fn prewrap(&mut self) {
        let Some(width) = self.prewrap_width else {
            return;
        };
        // Byte length bounds character length from above.
        while self.carryover.len() > width && char_len(&self.carryover) > width {
            let cut = cut_point(&self.carryover, width, self.word_window);
            let rest = self.carryover[cut.tail_start..].to_string();
            self.carryover.truncate(cut.head_end);
            let head = std::mem::replace(&mut self.carryover, rest);
            self.push_line(head);
        }
    }
}
