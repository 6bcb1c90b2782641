//! Numbered-choice extraction from narrator replies
//!
//! Game master replies end with an enumerated list of actions. The
//! extractor pulls those out so callers can offer them as quick
//! choices without re-parsing the reply themselves.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a numbered option line like `1. Enter the temple`
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s(.+)$").expect("valid regex"));

/// Extract numbered options from a reply, in order of appearance
///
/// A line contributes an option when the whole line matches
/// `^\d+\.\s(.+)$`; the captured text is trimmed. Lines that do not
/// match are skipped, so narrative paragraphs around the list are
/// ignored.
#[must_use]
pub fn extract_options(reply: &str) -> Vec<String> {
    reply
        .lines()
        .filter_map(|line| {
            OPTION_LINE
                .captures(line)
                .map(|caps| caps[1].trim().to_string())
        })
        .collect()
}
