//! LaTeX formula detection and placeholder text.
//!
//! A pure, stateless pass over cell text: find every formula, classify its
//! delimiter kind, and hand back an ordered, non-overlapping list. Nothing
//! here reads or writes a [`crate::types::TableStructure`] — this module
//! only ever sees plain strings.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Formula, FormulaKind};

static DISPLAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$([^$]+)\$\$").unwrap());
static INLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$]+)\$").unwrap());
static LATEX_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[a-zA-Z]+(?:\{[^}]*\}|\[[^\]]*\])*").unwrap());
static MATH_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(math|formula|equation)>(.*?)</(math|formula|equation)>").unwrap());
static SUP_SUB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(sup|sub)>(.*?)</(sup|sub)>").unwrap());
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d,.\s]+$").unwrap());
static SUP_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<sup>(.*?)</sup>").unwrap());
static SUB_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<sub>(.*?)</sub>").unwrap());
static CARET_BRACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^\{([^}]+)\}").unwrap());
static CARET_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^(.)").unwrap());
static UNDERSCORE_BRACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\{([^}]+)\}").unwrap());
static UNDERSCORE_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.)").unwrap());

/// Find every LaTeX formula in `text`, in left-to-right, non-overlapping order.
///
/// Detection order matters: display math is matched first so an inline-math
/// regex can't split a `$$...$$` pair in half, then inline math, then HTML
/// math tags, then sup/sub. A later-stage match that overlaps an
/// earlier-stage hit is dropped rather than re-tokenized.
pub fn tag_formulas(text: &str) -> Vec<Formula> {
    let mut formulas: Vec<Formula> = Vec::new();

    for m in DISPLAY_RE.find_iter(text) {
        let content = &m.as_str()[2..m.as_str().len() - 2];
        if looks_like_latex(content) {
            formulas.push(Formula {
                original_text: m.as_str().to_string(),
                latex_content: content.to_string(),
                kind: FormulaKind::Display,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    for m in INLINE_RE.find_iter(text) {
        if overlaps_existing(&formulas, m.start()) {
            continue;
        }
        let content = &m.as_str()[1..m.as_str().len() - 1];
        if looks_like_latex(content) {
            formulas.push(Formula {
                original_text: m.as_str().to_string(),
                latex_content: content.to_string(),
                kind: FormulaKind::Inline,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    for caps in MATH_TAG_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if overlaps_existing(&formulas, m.start()) {
            continue;
        }
        formulas.push(Formula {
            original_text: m.as_str().to_string(),
            latex_content: caps.get(2).map(|g| g.as_str().to_string()).unwrap_or_default(),
            kind: FormulaKind::Tag,
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in SUP_SUB_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if overlaps_existing(&formulas, m.start()) {
            continue;
        }
        let tag = caps.get(1).map(|g| g.as_str().to_ascii_lowercase()).unwrap_or_default();
        let content = caps.get(2).map(|g| g.as_str()).unwrap_or_default();
        let (kind, latex_content) = if tag == "sup" {
            (FormulaKind::TagSup, format!("^{{{content}}}"))
        } else {
            (FormulaKind::TagSub, format!("_{{{content}}}"))
        };
        formulas.push(Formula {
            original_text: m.as_str().to_string(),
            latex_content,
            kind,
            start: m.start(),
            end: m.end(),
        });
    }

    formulas.sort_by_key(|f| f.start);
    formulas
}

fn overlaps_existing(formulas: &[Formula], start: usize) -> bool {
    formulas.iter().any(|f| f.start <= start && start < f.end)
}

/// Conservative heuristic: text must contain a LaTeX command or a symbol
/// that isn't just currency-like digits/commas/dots.
fn looks_like_latex(text: &str) -> bool {
    if LATEX_COMMAND_RE.is_match(text) {
        return true;
    }

    let has_symbols = ['^', '_', '{', '}', '\\', '=', '+', '-', '*', '/']
        .iter()
        .any(|sym| text.contains(*sym));
    let is_currency = CURRENCY_RE.is_match(text.trim());

    has_symbols && !is_currency
}

/// Expand `^{...}`/`_{...}` LaTeX superscript/subscript notation in `text`
/// into `<sup>`/`<sub>` HTML tags. Used by the HTML builder when
/// `preserve_latex` text is being rendered back into markup rather than
/// kept verbatim.
pub fn expand_to_html(text: &str) -> String {
    let expanded = SUP_TAG_RE.replace_all(text, "<sup>$1</sup>");
    let expanded = SUB_TAG_RE.replace_all(&expanded, "<sub>$1</sub>");
    expanded.into_owned()
}

/// Convert a `^{...}`/`_{...}` LaTeX expression into HTML sup/sub markup,
/// stripping the leading `$`/`$$` delimiters first if present.
pub fn latex_to_html(original_text: &str) -> String {
    let stripped = if let Some(inner) = original_text.strip_prefix("$$").and_then(|s| s.strip_suffix("$$")) {
        inner
    } else if let Some(inner) = original_text.strip_prefix('$').and_then(|s| s.strip_suffix('$')) {
        inner
    } else {
        original_text
    };

    let text = CARET_BRACE_RE.replace_all(stripped, "<sup>$1</sup>");
    let text = CARET_CHAR_RE.replace_all(&text, "<sup>$1</sup>");
    let text = UNDERSCORE_BRACE_RE.replace_all(&text, "<sub>$1</sub>");
    let text = UNDERSCORE_CHAR_RE.replace_all(&text, "<sub>$1</sub>");
    text.into_owned()
}

/// Check brace and dollar-sign balance in a raw LaTeX string.
pub fn validate(formula_text: &str) -> Result<(), String> {
    let mut depth: i32 = 0;
    for ch in formula_text.chars() {
        match ch {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err("unbalanced braces: too many closing braces".to_string());
        }
    }
    if depth > 0 {
        return Err("unbalanced braces: too many opening braces".to_string());
    }

    if formula_text.matches('$').count() % 2 != 0 {
        return Err("unbalanced dollar signs".to_string());
    }

    Ok(())
}

/// Replace every detected formula in `text` with a `__LATEX_N__` placeholder,
/// returning the placeholder text alongside the formulas it stands in for.
/// `restore_placeholders` reverses this.
pub fn preserve_placeholders(text: &str) -> (String, Vec<Formula>) {
    let formulas = tag_formulas(text);
    if formulas.is_empty() {
        return (text.to_string(), formulas);
    }

    let mut result = String::new();
    let mut cursor = 0;
    for (i, formula) in formulas.iter().enumerate() {
        result.push_str(&text[cursor..formula.start]);
        result.push_str(&format!("__LATEX_{i}__"));
        cursor = formula.end;
    }
    result.push_str(&text[cursor..]);

    (result, formulas)
}

/// Substitute `__LATEX_N__` placeholders back with their original formula text.
pub fn restore_placeholders(text_with_placeholders: &str, formulas: &[Formula]) -> String {
    let mut result = text_with_placeholders.to_string();
    for (i, formula) in formulas.iter().enumerate() {
        let placeholder = format!("__LATEX_{i}__");
        if let Some(pos) = result.find(&placeholder) {
            result.replace_range(pos..pos + placeholder.len(), &formula.original_text);
        }
    }
    result
}
