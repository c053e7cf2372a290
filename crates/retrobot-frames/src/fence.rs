//! Triple-backtick fence tracking.
//!
//! Fence detection is a parity heuristic: every unescaped run of three
//! backticks toggles between "inside a code block" and "outside". The text
//! directly after an opening marker is taken as the language tag. Nested
//! fences, markers inside inline code and longer backtick runs are not
//! understood; they toggle parity like any other marker.

/// The fence marker itself.
pub const FENCE_MARKER: &str = "```";
/// Appended to a frame that ends inside a code block.
pub const CLOSE_MARKER: &str = "\n```";
/// Length of [`CLOSE_MARKER`] in characters.
pub const CLOSE_MARKER_LEN: usize = 4;
/// Longest language tag carried across frames; longer tags are dropped.
pub const MAX_FENCE_TAG: usize = 24;
/// Longest possible re-open prefix (marker, tag, newline).
pub const MAX_REOPEN_LEN: usize = FENCE_MARKER.len() + MAX_FENCE_TAG + 1;

/// Tracks whether the text seen so far leaves a code fence open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceTracker {
    open: Option<String>,
}

impl FenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that starts inside a fence tagged `tag`.
    #[must_use]
    pub fn reopened(tag: impl Into<String>) -> Self {
        Self {
            open: Some(tag.into()),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Language tag of the open fence, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.open.as_deref()
    }

    /// Consume the tracker, returning the open fence's tag.
    #[must_use]
    pub fn into_open(self) -> Option<String> {
        self.open
    }

    /// Update parity with every marker in `text`. Returns the marker count.
    pub fn observe(&mut self, text: &str) -> usize {
        let mut seen = 0;
        for pos in marker_positions(text) {
            seen += 1;
            self.open = match self.open.take() {
                Some(_) => None,
                None => Some(parse_tag(&text[pos + FENCE_MARKER.len()..])),
            };
        }
        seen
    }
}

/// The line that re-opens a fence at the start of a continuation frame.
#[must_use]
pub fn reopen_prefix(tag: &str) -> String {
    format!("{FENCE_MARKER}{tag}\n")
}

/// Number of unescaped fence markers in `text`.
#[must_use]
pub fn count_markers(text: &str) -> usize {
    marker_positions(text).count()
}

/// Byte offsets of unescaped fence markers, scanning left to right without
/// overlap. A marker directly preceded by `\` is escaped.
pub fn marker_positions(text: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = text.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i + FENCE_MARKER.len() <= bytes.len() {
            let at = i;
            if &bytes[at..at + 3] == b"```" && (at == 0 || bytes[at - 1] != b'\\') {
                i = at + 3;
                return Some(at);
            }
            i += 1;
        }
        None
    })
}

/// Whether `c` can continue the word after an opening marker.
pub(crate) fn is_tag_char(c: char) -> bool {
    !c.is_whitespace() && c != '`'
}

fn parse_tag(rest: &str) -> String {
    let tag: String = rest.chars().take_while(|c| is_tag_char(*c)).collect();
    let plausible = tag
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '+' | '-' | '_' | '.' | '#'));
    if plausible && tag.chars().count() <= MAX_FENCE_TAG {
        tag
    } else {
        String::new()
    }
}
