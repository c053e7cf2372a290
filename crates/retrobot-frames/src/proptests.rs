//! Property-based tests for the framing engine.
//!
//! These tests check invariants that must hold for arbitrary fragment
//! sequences:
//!
//! - No delivered message exceeds the frame cap
//! - Every frame and every delivered message has balanced fences
//! - Frame bodies reconstruct the input, up to whitespace
//! - Lines that fit a frame arrive byte for byte
//! - The final flush leaves nothing buffered

use std::collections::VecDeque;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use crate::accumulator::Accumulator;
use crate::config::FrameConfig;
use crate::delivery::DeliveryQueue;
use crate::fence::count_markers;
use crate::session::StreamSession;
use crate::splitter::{Frame, FrameSplitter};
use crate::testing::{Call, RecordingSink};

/// Characters that exercise line, word and fence handling, including ones
/// that form language tags.
const TEXT_ALPHABET: &[char] = &['a', 'b', 'é', ' ', ' ', '\n', '`', '`', '\\', '\r'];

/// Same, but without characters that can form a language tag, so re-open
/// prefixes add only backticks and newlines.
const UNTAGGED_ALPHABET: &[char] = &['{', '}', '!', '«', ' ', '\n', '\n', '`', '`', '\\'];

fn fragments(alphabet: &'static [char]) -> impl Strategy<Value = Vec<String>> {
    let fragment = prop::collection::vec(prop::sample::select(alphabet), 0..120)
        .prop_map(|chars| chars.into_iter().collect::<String>());
    prop::collection::vec(fragment, 0..24)
}

/// Characters without fences or carriage returns, so nothing is padded or
/// rewritten on the way through.
const PLAIN_ALPHABET: &[char] = &['a', 'b', 'é', '!', ' ', ' '];

/// Lines no longer than the smallest frame carries whole, re-cut into
/// fragments at arbitrary character positions.
fn fitting_lines() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    let line = prop::collection::vec(prop::sample::select(PLAIN_ALPHABET), 0..=60)
        .prop_map(|chars| chars.into_iter().collect::<String>());
    (
        prop::collection::vec(line, 0..40),
        prop::collection::vec(1usize..90, 1..20),
    )
        .prop_map(|(lines, cuts)| {
            let text = lines.join("\n");
            let chars: Vec<char> = text.chars().collect();
            let mut fragments = Vec::new();
            let mut start = 0;
            for width in cuts.iter().cycle() {
                if start >= chars.len() {
                    break;
                }
                let end = (start + width).min(chars.len());
                fragments.push(chars[start..end].iter().collect());
                start = end;
            }
            (lines, fragments)
        })
}

fn config(max_len: usize, word_window: usize, prewrap: Option<usize>) -> FrameConfig {
    FrameConfig {
        max_frame_length: max_len,
        word_window,
        prewrap_width: prewrap,
        flush_interval: Duration::from_millis(1000),
    }
}

fn config_strategy() -> impl Strategy<Value = FrameConfig> {
    (
        64usize..300,
        0usize..40,
        prop::option::of(1usize..200),
    )
        .prop_map(|(max_len, window, prewrap)| config(max_len, window, prewrap))
}

/// Accumulate and split everything, as the final flush does.
fn split_all(config: &FrameConfig, input: &[String]) -> (Vec<Frame>, Accumulator) {
    let mut acc = Accumulator::new(config);
    for fragment in input {
        acc.append(fragment).unwrap();
    }
    acc.finish();

    let splitter = FrameSplitter::new(config);
    let mut fence = None;
    let mut frames = Vec::new();
    while let Some(frame) = splitter.split(acc.ready_lines_mut(), &mut fence) {
        frames.push(frame);
    }
    (frames, acc)
}

/// Drive a session with fragments arriving `gap_ms` apart.
fn run_session(config: FrameConfig, input: &[String], gap_ms: u64) -> RecordingSink {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let sink = RecordingSink::new();
    let mut session = StreamSession::new(config, sink.clone()).unwrap();
    runtime.block_on(async move {
        let start = Instant::now();
        for (i, fragment) in input.iter().enumerate() {
            let now = start + Duration::from_millis(gap_ms * i as u64);
            session.push(fragment, now).await.unwrap();
        }
        session.finish().await;
    });
    sink
}

fn visible(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '`')
        .collect()
}

// ==================== Splitter Property Tests ====================

proptest! {
    /// Every formed frame fits the cap.
    #[test]
    fn frames_never_exceed_cap(
        config in config_strategy(),
        input in fragments(TEXT_ALPHABET),
    ) {
        let (frames, _) = split_all(&config, &input);
        for frame in &frames {
            prop_assert!(frame.len() <= config.max_frame_length);
        }
    }

    /// Every formed frame, taken alone, has an even number of markers.
    #[test]
    fn frames_are_fence_balanced(
        config in config_strategy(),
        input in fragments(TEXT_ALPHABET),
    ) {
        let (frames, _) = split_all(&config, &input);
        for frame in &frames {
            prop_assert_eq!(count_markers(frame.content()) % 2, 0, "frame: {:?}", frame.content());
        }
    }

    /// Frame bodies, padding removed, reconstruct the input.
    #[test]
    fn frame_bodies_are_lossless(
        config in config_strategy(),
        input in fragments(TEXT_ALPHABET),
    ) {
        let (frames, _) = split_all(&config, &input);
        let output: String = frames.iter().map(Frame::body).collect();
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        prop_assert_eq!(strip(&output), strip(&input.concat()));
    }

    /// Nothing stays buffered after the final flush.
    #[test]
    fn final_flush_drains_everything(
        config in config_strategy(),
        input in fragments(TEXT_ALPHABET),
    ) {
        let (_, acc) = split_all(&config, &input);
        prop_assert!(acc.is_drained());
    }
}

// ==================== Session Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every sink call carries at most `max_frame_length` characters and a
    /// balanced set of fences.
    #[test]
    fn sink_calls_respect_cap_and_fences(
        config in config_strategy(),
        input in fragments(TEXT_ALPHABET),
        gap_ms in 0u64..1500,
    ) {
        let max_len = config.max_frame_length;
        let sink = run_session(config, &input, gap_ms);
        for call in sink.calls() {
            let content = call.content();
            prop_assert!(content.chars().count() <= max_len);
            prop_assert_eq!(count_markers(content) % 2, 0, "call: {:?}", call);
        }
    }

    /// Delivered messages reconstruct the input, ignoring whitespace and
    /// fence padding.
    #[test]
    fn delivered_messages_are_lossless(
        config in config_strategy(),
        input in fragments(UNTAGGED_ALPHABET),
        gap_ms in 0u64..1500,
    ) {
        let sink = run_session(config, &input, gap_ms);
        let delivered: String = sink.messages().iter().map(|m| visible(m)).collect();
        prop_assert_eq!(delivered, visible(&input.concat()));
    }

    /// With line-based accumulation and lines that fit, delivered messages
    /// are exactly the non-blank input lines.
    #[test]
    fn fitting_lines_are_delivered_exactly(
        max_len in 64usize..300,
        word_window in 0usize..40,
        (lines, input) in fitting_lines(),
        gap_ms in 0u64..1500,
    ) {
        let sink = run_session(config(max_len, word_window, None), &input, gap_ms);
        let expected: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|line| !line.trim().is_empty())
            .collect();
        prop_assert_eq!(sink.messages().join("\n"), expected.join("\n"));
    }

    /// Syncing the open message to its own content never calls the sink.
    #[test]
    fn identical_sync_is_idempotent(content in "[a-z ]{1,60}") {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let sink = RecordingSink::new();
        let mut queue = DeliveryQueue::new(2000);
        runtime.block_on(async {
            queue.deliver(&sink, Frame::new(content.clone())).await.unwrap();
            queue.sync_open(&sink, &content).await.unwrap();
            queue.sync_open(&sink, &content).await.unwrap();
        });
        prop_assert_eq!(sink.calls(), vec![Call::Send(content)]);
    }
}

#[test]
fn split_all_handles_empty_input() {
    let (frames, acc) = split_all(&FrameConfig::default(), &[]);
    assert!(frames.is_empty());
    assert!(acc.is_drained());
    assert_eq!(acc.ready_lines(), &VecDeque::<String>::new());
}
