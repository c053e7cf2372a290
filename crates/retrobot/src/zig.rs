//! ANSI colouring of ```zig code blocks for Discord's `ansi` highlighter.
//!
//! Highlighting is a chain of token rules tried in priority order. Text a
//! rule matches is painted with its colour; the gaps between matches fall
//! through to the next rule, and whatever no rule claims is painted white.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Annotated blocks at least this long are not echoed back; the `ansi`
/// wrapper must still fit in one message.
pub const MAX_ANNOTATED_LENGTH: usize = 1990;

const WHITE: &str = "\x1b[37m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";

const CODE_BLOCK: &str = r"(?s)```zig\s*(.*?)```";

/// Highest priority first. A rule with a capture group paints only the
/// group; the rest of its match falls through.
const ZIG_RULES: &[(&str, &str)] = &[
    // comments
    (r"//.*", WHITE),
    // strings and multiline string lines
    (r#""(?:\\.|[^\n"])*"|\\\\.*"#, YELLOW),
    // builtins
    (r"@\w+", RED),
    (
        r"\b(?:addrspace|align|allowzero|and|anyframe|anytype|asm|break|callconv|catch|comptime|const|continue|defer|else|enum|errdefer|error|export|extern|fn|for|if|inline|noalias|noinline|nosuspend|opaque|or|orelse|packed|pub|resume|return|linksection|struct|suspend|switch|test|threadlocal|try|union|unreachable|usingnamespace|var|volatile|while)\b",
        GREEN,
    ),
    (
        r"\b(?:[uif]\d+|isize|usize|bool|anyopaque|void|noreturn|type|anyerror|comptime_int|comptime_float)\b",
        RED,
    ),
    // numbers, literals and char literals
    (
        r"(?:-|\b)[0-9][xo+\-\wpP]*|\b(?:true|false|null|undefined)\b|'(?:\\.|[^\n'])*'",
        YELLOW,
    ),
    // types
    (r"\b[A-Z]\w*", MAGENTA),
    // calls
    (r"\b([a-z_]\w*)\(", CYAN),
    // everything else that looks like a word
    (r"\b\w+", BLUE),
];

static HIGHLIGHTER: LazyLock<Option<ZigHighlighter>> = LazyLock::new(|| {
    ZigHighlighter::new()
        .inspect_err(|e| warn!(error = %e, "zig highlighting disabled"))
        .ok()
});

struct Rule {
    pattern: Regex,
    color: &'static str,
}

pub struct ZigHighlighter {
    code_block: Regex,
    rules: Vec<Rule>,
}

impl ZigHighlighter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = ZIG_RULES
            .iter()
            .map(|&(pattern, color)| {
                Ok::<_, regex::Error>(Rule {
                    pattern: Regex::new(pattern)?,
                    color,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            code_block: Regex::new(CODE_BLOCK)?,
            rules,
        })
    }

    /// Contents of every ```zig block in `text`, in order.
    pub fn code_blocks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.code_block
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|block| block.as_str())
            .collect()
    }

    /// `source` with an ANSI colour code in front of every token.
    pub fn annotate(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() * 2);
        paint(&self.rules, source, &mut out);
        out
    }

    /// One `ansi` block reply per zig block that fits in a message.
    pub fn replies(&self, text: &str) -> Vec<String> {
        self.code_blocks(text)
            .into_iter()
            .map(|block| self.annotate(block))
            .filter(|annotated| annotated.chars().count() < MAX_ANNOTATED_LENGTH)
            .map(|annotated| format!("```ansi\n{annotated}```"))
            .collect()
    }
}

fn paint(rules: &[Rule], source: &str, out: &mut String) {
    let Some((rule, rest)) = rules.split_first() else {
        out.push_str(WHITE);
        out.push_str(source);
        return;
    };

    let mut last = 0;
    for caps in rule.pattern.captures_iter(source) {
        let Some(token) = caps.get(1).or_else(|| caps.get(0)) else {
            continue;
        };
        if token.start() > last {
            paint(rest, &source[last..token.start()], out);
        }
        out.push_str(rule.color);
        out.push_str(token.as_str());
        last = token.end();
    }
    if last < source.len() {
        paint(rest, &source[last..], out);
    }
}

/// Coloured replies for the zig blocks in a chat message.
pub fn replies(text: &str) -> Vec<String> {
    if !text.contains("```zig") {
        return Vec::new();
    }
    HIGHLIGHTER
        .as_ref()
        .map(|highlighter| highlighter.replies(text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> ZigHighlighter {
        ZigHighlighter::new().unwrap()
    }

    #[test]
    fn extracts_every_zig_block() {
        let text = "look ```zig\nconst x = 1;``` and ```zig fn f() void {}``` but ```rust\nfn g()```";
        assert_eq!(
            highlighter().code_blocks(text),
            vec!["const x = 1;", "fn f() void {}"]
        );
    }

    #[test]
    fn paints_declaration() {
        assert_eq!(
            highlighter().annotate("const x = 1;"),
            format!("{GREEN}const{WHITE} {BLUE}x{WHITE} = {YELLOW}1{WHITE};")
        );
    }

    #[test]
    fn call_paints_name_but_not_paren() {
        assert_eq!(
            highlighter().annotate("foo(bar)"),
            format!("{CYAN}foo{WHITE}({BLUE}bar{WHITE})")
        );
    }

    #[test]
    fn comments_and_strings_win_over_keywords() {
        let h = highlighter();
        assert_eq!(h.annotate("// const fn"), format!("{WHITE}// const fn"));
        assert_eq!(h.annotate("\"fn\""), format!("{YELLOW}\"fn\""));
    }

    #[test]
    fn builtins_types_and_primitives() {
        assert_eq!(
            highlighter().annotate("@import Foo u8"),
            format!("{RED}@import{WHITE} {MAGENTA}Foo{WHITE} {RED}u8")
        );
    }

    #[test]
    fn replies_wrap_blocks_in_ansi_fence() {
        assert_eq!(
            highlighter().replies("```zig\nfoo```"),
            vec![format!("```ansi\n{BLUE}foo```")]
        );
    }

    #[test]
    fn oversized_blocks_get_no_reply() {
        let text = format!("```zig\n{}```", "x ".repeat(500));
        assert!(highlighter().replies(&text).is_empty());
    }

    #[test]
    fn text_without_zig_blocks_gets_no_reply() {
        assert!(replies("plain text").is_empty());
        assert!(replies("```zig\nunterminated").is_empty());
    }
}
