//! Removal of `<think>` reasoning spans emitted by some models

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref THINK_SPAN: Regex = Regex::new(r"(?s)<think>.*?</think>").unwrap();
}

const THINK_OPEN: &str = "<think>";

/// Strip every `<think>...</think>` span and trim the rest.
/// An opening tag that is never closed hides everything after it.
pub fn strip_think_tags(content: &str) -> String {
    let stripped = THINK_SPAN.replace_all(content, "");

    let visible = match stripped.find(THINK_OPEN) {
        Some(idx) => &stripped[..idx],
        None => &stripped[..],
    };

    visible.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_span() {
        assert_eq!(strip_think_tags("<think>internal</think>Visible text"), "Visible text");
    }

    #[test]
    fn test_strips_multiline_and_multiple_spans() {
        let raw = "<think>\nstep one\nstep two\n</think>\n\nIntro.\n<think>more</think>\nOutro.";
        assert_eq!(strip_think_tags(raw), "Intro.\n\nOutro.");
    }

    #[test]
    fn test_unterminated_span_is_dropped() {
        assert_eq!(strip_think_tags("Answer first. <think>never closed"), "Answer first.");
        assert_eq!(strip_think_tags("<think>only reasoning"), "");
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(strip_think_tags("  **AAPL** rose 2%.  "), "**AAPL** rose 2%.");
    }
}
