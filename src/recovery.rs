//! Detection and best-effort repair of truncated HTML/OTSL output, as
//! produced when an upstream model generation hits a token limit mid-table.
//!
//! These are text-level heuristics over the raw string, deliberately
//! independent of [`crate::html::parser`]/[`crate::otsl::parser`] — they run
//! *before* a parse is even attempted, so a caller can decide whether to
//! auto-close and retry or to surface the truncation to the user.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TRAILING_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<[a-z]+(?:\s|$)").unwrap());
static OTSL_TRAILING_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<[a-z_]+$").unwrap());

/// Which wire format a string of content looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Otsl,
    Unknown,
}

/// The result of [`detect_truncation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationReport {
    pub is_truncated: bool,
    pub content_kind: ContentKind,
    pub reason: String,
}

/// True if `html` has more opening `<table`/`<tr`/`<td`/`<th` tags than
/// matching closers, or ends mid-tag.
pub fn is_html_truncated(html: &str) -> bool {
    let lower = html.to_lowercase();

    if count_occurrences(&lower, "<table") > count_occurrences(&lower, "</table>") {
        return true;
    }
    if count_occurrences(&lower, "<tr") > count_occurrences(&lower, "</tr>") {
        return true;
    }
    let open_cells = count_occurrences(&lower, "<td") + count_occurrences(&lower, "<th");
    let closed_cells = count_occurrences(&lower, "</td>") + count_occurrences(&lower, "</th>");
    if open_cells > closed_cells {
        return true;
    }

    let trimmed = html.trim();
    let tail_start = trimmed.len().saturating_sub(20);
    HTML_TRAILING_TAG_RE.is_match(&trimmed[tail_start..])
}

/// Append one `</table>` per unmatched `<table` opener.
pub fn auto_close_html(html: &str) -> String {
    let lower = html.to_lowercase();
    let missing = count_occurrences(&lower, "<table").saturating_sub(count_occurrences(&lower, "</table>"));
    let mut result = html.to_string();
    for _ in 0..missing {
        result.push_str("</table>");
    }
    result
}

/// True if `otsl` opens with `<otsl>` but never closes it, or ends mid-tag.
pub fn is_otsl_truncated(otsl: &str) -> bool {
    let trimmed = otsl.trim();
    if trimmed.starts_with("<otsl>") && !trimmed.ends_with("</otsl>") {
        return true;
    }
    OTSL_TRAILING_TAG_RE.is_match(trimmed)
}

/// Append `</otsl>` if the string opens with `<otsl>` but never closes it.
pub fn auto_close_otsl(otsl: &str) -> String {
    let trimmed = otsl.trim();
    if trimmed.starts_with("<otsl>") && !trimmed.ends_with("</otsl>") {
        format!("{otsl}</otsl>")
    } else {
        otsl.to_string()
    }
}

/// Classify `content` as HTML or OTSL and report whether it looks truncated.
pub fn detect_truncation(content: &str) -> TruncationReport {
    let lower = content.to_lowercase();
    let trimmed_lower = lower.trim();

    let content_kind = if trimmed_lower.starts_with("<otsl>") {
        ContentKind::Otsl
    } else if trimmed_lower.contains("<table") {
        ContentKind::Html
    } else {
        return TruncationReport {
            is_truncated: false,
            content_kind: ContentKind::Unknown,
            reason: "not HTML or OTSL".to_string(),
        };
    };

    match content_kind {
        ContentKind::Html => {
            if is_html_truncated(content) {
                let reason = if !lower.contains("</table>") {
                    "missing closing </table> tag"
                } else if count_occurrences(&lower, "<tr") > count_occurrences(&lower, "</tr>") {
                    "unclosed <tr> tags"
                } else if count_occurrences(&lower, "<td") + count_occurrences(&lower, "<th")
                    > count_occurrences(&lower, "</td>") + count_occurrences(&lower, "</th>")
                {
                    "unclosed <td>/<th> tags"
                } else {
                    "incomplete tag syntax"
                };
                TruncationReport { is_truncated: true, content_kind, reason: reason.to_string() }
            } else {
                TruncationReport { is_truncated: false, content_kind, reason: "complete HTML".to_string() }
            }
        }
        ContentKind::Otsl => {
            if is_otsl_truncated(content) {
                let reason = if !content.contains("</otsl>") {
                    "missing closing </otsl> tag"
                } else {
                    "incomplete tag syntax"
                };
                TruncationReport { is_truncated: true, content_kind, reason: reason.to_string() }
            } else {
                TruncationReport { is_truncated: false, content_kind, reason: "complete OTSL".to_string() }
            }
        }
        ContentKind::Unknown => unreachable!("filtered out above"),
    }
}

/// Detect and, if `auto_fix`, repair truncation in one call. Returns the
/// (possibly patched) content, whether truncation was found, and a message.
pub fn fix_truncated_output(content: &str, auto_fix: bool) -> (String, bool, String) {
    let report = detect_truncation(content);

    if !report.is_truncated {
        return (content.to_string(), false, format!("no truncation detected ({:?})", report.content_kind));
    }

    if !auto_fix {
        return (content.to_string(), true, format!("truncated: {} (not fixed)", report.reason));
    }

    match report.content_kind {
        ContentKind::Html => (auto_close_html(content), true, "fixed: added missing closing tag(s)".to_string()),
        ContentKind::Otsl => (auto_close_otsl(content), true, "fixed: added missing </otsl> tag".to_string()),
        ContentKind::Unknown => (content.to_string(), true, format!("truncated but cannot fix: {}", report.reason)),
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
