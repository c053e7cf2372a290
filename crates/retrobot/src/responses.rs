//! Canned replies and dot-commands for plain text messages.
//!
//! Everything here is platform independent: the gateway supplies the message
//! text plus whatever context a command needs, and sends back each returned
//! string as one reply.

use rand::Rng;

use crate::words::WordLists;
use crate::zig;

/// Discord's per-message character limit.
pub const MAX_REPLY_LENGTH: usize = 2000;

const COMMAND_PREFIX: char = '.';

/// What a command may need to know about where the message was posted.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    /// Custom emojis of the guild, rendered for chat. `None` outside guilds.
    pub guild_emojis: Option<Vec<String>>,
}

/// Whether `text` needs [`MessageContext::guild_emojis`] filled in.
#[must_use]
pub fn wants_emojis(text: &str) -> bool {
    text == ".emojis"
}

/// Replies to send for `text`, in order. Empty when the bot stays quiet.
pub fn respond<R: Rng + ?Sized>(
    text: &str,
    ctx: &MessageContext,
    words: &WordLists,
    rng: &mut R,
) -> Vec<String> {
    match text {
        "ping" => return vec!["pong".to_string()],
        "no u" | "darn bot" => return vec!["no u".to_string()],
        _ => {}
    }

    let lower = text.to_lowercase();
    if lower.starts_with("should i") || lower.starts_with("should we") {
        let answer = if rng.random_bool(0.5) { "yes" } else { "no" };
        return vec![answer.to_string()];
    }

    let mut replies = zig::replies(text);

    let Some(command) = text.strip_prefix(COMMAND_PREFIX) else {
        return replies;
    };
    let pieces = simple_command(command, ctx, rng)
        .or_else(|| acronym_command(command, words, rng))
        .unwrap_or_default();
    replies.extend(aggregate(&pieces, MAX_REPLY_LENGTH));
    replies
}

fn simple_command<R: Rng + ?Sized>(
    command: &str,
    ctx: &MessageContext,
    rng: &mut R,
) -> Option<Vec<String>> {
    let reply = match command {
        "emojis" => {
            return Some(match &ctx.guild_emojis {
                Some(emojis) => emojis.clone(),
                None => vec!["This isn't a server bruh.".to_string()],
            });
        }
        "rand" => format!("Here's your random u64: {}", rng.random::<u64>()),
        "randhex" => format!("Here's your random u64: 0x{:x}", rng.random::<u64>()),
        "randbit" => format!(
            "Here's your random bit: {}",
            if rng.random_bool(0.5) { "0" } else { "1" }
        ),
        "randfloat" => format!("Here's your random float: {}", rng.random::<f64>()),
        _ => return None,
    };
    Some(vec![reply])
}

/// `.acr <text>`: one word per ASCII letter of `text`, space separated.
fn acronym_command<R: Rng + ?Sized>(
    command: &str,
    words: &WordLists,
    rng: &mut R,
) -> Option<Vec<String>> {
    let letters: String = command
        .strip_prefix("acr ")?
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return None;
    }

    let acronym = words.acronym(&letters, rng);
    let last = acronym.len().saturating_sub(1);
    let mut pieces = Vec::with_capacity(acronym.len() * 2);
    for (idx, word) in acronym.into_iter().enumerate() {
        pieces.push(word);
        if idx < last {
            pieces.push(" ".to_string());
        }
    }
    Some(pieces)
}

/// Concatenate `pieces` into as few messages as possible, each at most
/// `max_len` characters. A piece longer than `max_len` is split on its own.
pub fn aggregate(pieces: &[String], max_len: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        for chunk in chunks(piece, max_len) {
            let len = chunk.chars().count();
            if current_len + len > max_len && !current.is_empty() {
                messages.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(chunk);
            current_len += len;
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

/// Split `text` into runs of at most `max_len` characters.
fn chunks(text: &str, max_len: usize) -> impl Iterator<Item = &str> {
    let max_len = max_len.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(max_len)
            .map_or(rest.len(), |(idx, _)| idx);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}
