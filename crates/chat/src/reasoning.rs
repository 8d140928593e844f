//! Removal of `<think>...</think>` reasoning blocks from model output.

use std::sync::LazyLock;

use regex::Regex;

/// Non-greedy match of one reasoning block, spanning newlines.
const REASONING_PATTERN: &str = r"(?s)<think>.*?</think>";

static REASONING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REASONING_PATTERN).expect("valid regex"));

/// Remove every reasoning block and trim the ends of what remains.
///
/// Text between and around blocks is otherwise left untouched.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_RE.replace_all(text, "").trim().to_string()
}
