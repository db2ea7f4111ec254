//! Resilient JSON extractor for oracle output.
//!
//! The model is asked for bare JSON but routinely wraps it in code fences
//! or commentary. This module recovers the one JSON value of interest or
//! reports failure. It never panics and never repairs broken JSON: no
//! brace balancing, no trailing-comma fixes.

use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("empty response")]
    Empty,

    #[error("no JSON value found in response")]
    Unparseable {
        /// The cleaned text, kept for diagnostics.
        raw: String,
    },
}

/// Recovers a single JSON value (object or array) from free-form text.
///
/// Steps: strip code fences, drop an obvious wrapping label line, try a
/// direct parse, then fall back to the widest `{...}` and `[...]` spans.
pub fn extract(text: &str) -> Result<Value, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    let unfenced = strip_fences(text);
    let cleaned = strip_wrapping_label(unfenced);

    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Ok(value);
    }
    if let Some(value) = parse_span(&cleaned, '{', '}') {
        return Ok(value);
    }
    if let Some(value) = parse_span(&cleaned, '[', ']') {
        return Ok(value);
    }

    Err(ExtractError::Unparseable {
        raw: cleaned.into_owned(),
    })
}

/// Strips a leading ```lang marker and a trailing ``` marker, if present.
fn strip_fences(text: &str) -> &str {
    let mut out = text.trim();
    if let Some(rest) = out.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        out = rest.trim_start();
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim_end();
    }
    out
}

/// When the text spans more than two lines and the first line is clearly
/// not the start of a JSON value, drop the first and last line. This peels
/// off a wrapping label the fence strip did not catch.
fn strip_wrapping_label(text: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > 2 {
        let first = lines[0].trim_start();
        if !first.starts_with('{') && !first.starts_with('[') {
            return Cow::Owned(lines[1..lines.len() - 1].join("\n").trim().to_string());
        }
    }
    Cow::Borrowed(text)
}

/// Greedy span recovery: first `open` to last `close`, spanning newlines.
fn parse_span(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
