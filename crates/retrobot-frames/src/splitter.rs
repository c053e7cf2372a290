//! Frame formation: packing completed lines into size-bounded frames.

use std::collections::VecDeque;

use crate::char_len;
use crate::config::FrameConfig;
use crate::fence::{
    CLOSE_MARKER, CLOSE_MARKER_LEN, FENCE_MARKER, FenceTracker, MAX_FENCE_TAG, is_tag_char,
    reopen_prefix,
};

// ============================================================================
// Frame
// ============================================================================

/// One size-bounded unit of text handed to a sink.
///
/// Besides its content, a frame remembers the fence padding the splitter
/// added so that the padding can be stripped again (`body`) and so that two
/// consecutive frames can be joined back into one code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    content: String,
    /// Byte length of the re-open prefix at the start of `content`.
    reopen_len: usize,
    /// Whether `content` ends with an appended [`CLOSE_MARKER`].
    closes_fence: bool,
}

impl Frame {
    /// A frame without fence padding.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reopen_len: 0,
            closes_fence: false,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> String {
        self.content
    }

    /// Content with fence padding removed.
    #[must_use]
    pub fn body(&self) -> &str {
        let end = if self.closes_fence {
            self.content.len() - CLOSE_MARKER.len()
        } else {
            self.content.len()
        };
        &self.content[self.reopen_len..end]
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        char_len(&self.content)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[must_use]
    pub fn reopens_fence(&self) -> bool {
        self.reopen_len > 0
    }

    #[must_use]
    pub fn closes_fence(&self) -> bool {
        self.closes_fence
    }

    /// Join `next` after this frame with a line break.
    ///
    /// When this frame closed a fence that `next` re-opens, the close and
    /// re-open padding at the seam are dropped so the code block continues
    /// uninterrupted.
    #[must_use]
    pub fn join(&self, next: &Frame) -> Frame {
        if self.is_empty() {
            return next.clone();
        }
        if next.is_empty() {
            return self.clone();
        }

        let mut content = String::with_capacity(self.content.len() + next.content.len() + 1);
        if self.closes_fence && next.reopens_fence() {
            content.push_str(&self.content[..self.content.len() - CLOSE_MARKER.len()]);
            content.push('\n');
            content.push_str(&next.content[next.reopen_len..]);
        } else {
            content.push_str(&self.content);
            content.push('\n');
            content.push_str(&next.content);
        }

        Frame {
            content,
            reopen_len: self.reopen_len,
            closes_fence: next.closes_fence,
        }
    }
}

// ============================================================================
// FrameSplitter
// ============================================================================

/// Packs completed lines into frames of at most `max_len` characters.
#[derive(Debug, Clone)]
pub struct FrameSplitter {
    max_len: usize,
    word_window: usize,
}

impl FrameSplitter {
    #[must_use]
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            max_len: config.max_frame_length,
            word_window: config.word_window,
        }
    }

    /// Form one frame from the front of `lines`.
    ///
    /// `fence` carries the tag of a code block left open by the previous
    /// frame; on return it holds the tag the next frame must re-open, if any.
    /// Returns `None` when `lines` is empty.
    pub fn split(&self, lines: &mut VecDeque<String>, fence: &mut Option<String>) -> Option<Frame> {
        if lines.is_empty() {
            return None;
        }

        let carried = fence.take();
        let prefix = carried.as_deref().map(reopen_prefix).unwrap_or_default();
        let budget = self
            .max_len
            .saturating_sub(CLOSE_MARKER_LEN + char_len(&prefix))
            .max(1);

        let mut body = String::new();
        let mut used = 0;
        let mut consumed = 0;
        while let Some(line) = lines.pop_front() {
            let cost = char_len(&line) + usize::from(consumed > 0);
            if used + cost > budget {
                lines.push_front(line);
                break;
            }
            if consumed > 0 {
                body.push('\n');
            }
            body.push_str(&line);
            used += cost;
            consumed += 1;
        }

        // The first line alone does not fit: cut it and requeue the rest.
        if consumed == 0
            && let Some(line) = lines.pop_front()
        {
            let cut = cut_point(&line, budget, self.word_window);
            body.push_str(&line[..cut.head_end]);
            if cut.tail_start < line.len() {
                lines.push_front(line[cut.tail_start..].to_string());
            }
        }

        let mut tracker = match carried {
            Some(tag) => FenceTracker::reopened(tag),
            None => FenceTracker::new(),
        };
        tracker.observe(&body);

        let reopen_len = prefix.len();
        let mut content = prefix;
        content.push_str(&body);

        let closes_fence = match tracker.into_open() {
            Some(tag) => {
                content.push_str(CLOSE_MARKER);
                *fence = Some(tag);
                true
            }
            None => false,
        };

        Some(Frame {
            content,
            reopen_len,
            closes_fence,
        })
    }
}

// ============================================================================
// Cut Points
// ============================================================================

/// Where to break a line that is too long.
///
/// `text[..head_end]` stays, `text[tail_start..]` moves on; anything between
/// (a single whitespace character at a word break) is replaced by the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cut {
    pub head_end: usize,
    pub tail_start: usize,
}

/// Find a break point keeping at most `max_chars` characters in the head.
///
/// Prefers the last whitespace within `word_window` characters of the limit,
/// otherwise cuts hard at the limit, backing off so neither a run of
/// backticks nor a marker and its language tag are split.
pub(crate) fn cut_point(text: &str, max_chars: usize, word_window: usize) -> Cut {
    let Some((hard, at_hard)) = text.char_indices().nth(max_chars) else {
        return Cut {
            head_end: text.len(),
            tail_start: text.len(),
        };
    };

    let window_start = text[..hard]
        .char_indices()
        .rev()
        .take(word_window)
        .last()
        .map_or(hard, |(i, _)| i);
    let search_end = hard + at_hard.len_utf8();
    if let Some((offset, ch)) = text[window_start..search_end]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
    {
        let pos = window_start + offset;
        if pos > 0 {
            return Cut {
                head_end: pos,
                tail_start: pos + ch.len_utf8(),
            };
        }
    }

    let bytes = text.as_bytes();
    let mut end = tag_marker_start(text, hard).unwrap_or(hard);
    while end > 0 && bytes[end - 1] == b'`' && bytes[end] == b'`' {
        end -= 1;
    }
    if end == 0 {
        end = hard;
    }
    Cut {
        head_end: end,
        tail_start: end,
    }
}

/// Start of the fence marker whose language tag runs across `pos`.
fn tag_marker_start(text: &str, pos: usize) -> Option<usize> {
    if !text[pos..].chars().next().is_some_and(is_tag_char) {
        return None;
    }
    let tag_start = text[..pos]
        .char_indices()
        .rev()
        .take(MAX_FENCE_TAG)
        .take_while(|(_, c)| is_tag_char(*c))
        .last()
        .map_or(pos, |(i, _)| i);
    text[..tag_start]
        .ends_with(FENCE_MARKER)
        .then(|| tag_start - FENCE_MARKER.len())
}
