use regex::Regex;
use std::sync::LazyLock;

pub const SUMMARY_MAX_CHARS: usize = 120;

static TEAMMATE_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<teammate-message[^>]*>").expect("static regex is valid")
});
static TEAMMATE_CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</teammate-message>").expect("static regex is valid"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex is valid"));

/// Flattens text onto one line and caps it at `max_chars` code points.
///
/// Newlines become spaces, runs of spaces collapse, and an over-long result is cut to
/// `max_chars - 2` characters followed by `..`.
pub fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let mut flat = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        let ch = match ch {
            '\n' | '\r' => ' ',
            other => other,
        };
        if ch == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        flat.push(ch);
    }

    let trimmed = flat.trim();
    cut_with_ellipsis(trimmed, max_chars)
}

pub fn truncate_summary(text: &str) -> String {
    truncate_one_line(text, SUMMARY_MAX_CHARS)
}

/// Tool argument shortening: newlines become spaces, nothing else is normalized.
pub fn truncate_value(text: &str, max_chars: usize) -> String {
    cut_with_ellipsis(&flatten_line(text), max_chars)
}

/// Replaces line breaks with spaces, leaving everything else as is.
pub fn flatten_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

fn cut_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(2)).collect();
    out.push_str("..");
    out
}

pub fn strip_teammate_tags(text: &str) -> String {
    let opened = TEAMMATE_OPEN_TAG.replace_all(text, "");
    TEAMMATE_CLOSE_TAG.replace_all(&opened, "").into_owned()
}

pub fn strip_angle_tags(text: &str) -> String {
    ANY_TAG.replace_all(text, "").into_owned()
}

/// Hard-wraps text at `width` code points per line.
///
/// Every `\n` starts a new line and empty segments are kept as empty lines.
pub fn wrap_hard(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for segment in text.split('\n') {
        if segment.is_empty() {
            out.push(String::new());
            continue;
        }
        let chars: Vec<char> = segment.chars().collect();
        for chunk in chars.chunks(width) {
            out.push(chunk.iter().collect());
        }
    }
    out
}
