//! OTSL string -> [`TableStructure`] parsing.
//!
//! Grid reconstruction is a two-pass, two-cursor walk: `tag_idx` tracks the
//! position within a row's own token list (used for span lookahead),
//! `grid_col` tracks the position within the occupancy grid (used for
//! placement). They diverge whenever a cell's colspan is greater than 1,
//! which is exactly why both must be tracked independently — see step 7 of
//! the grammar this module implements.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TableIrError};
use crate::latex;
use crate::otsl::token::{OtslToken, CELL_TAG_NAMES};
use crate::types::{Cell, CellContent, ConversionOptions, HeaderType, TableStructure};

static CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<caption>(.*?)</caption>").unwrap());
static TFOOT_ROWS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<tfoot_rows>([\d,]*)</tfoot_rows>").unwrap());
static LOC_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:<loc_\d+>)+").unwrap());
static CELL_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let tags = CELL_TAG_NAMES.join("|");
    Regex::new(&format!(r"(?s)<({tags})>(.*?)(?=<(?:{tags}|nl)>|$)")).unwrap()
});

const WRAPPER_OPEN: &str = "<otsl>";
const WRAPPER_CLOSE: &str = "</otsl>";

/// Parse an OTSL string into a [`TableStructure`].
pub fn parse(input: &str, options: &ConversionOptions) -> Result<TableStructure> {
    tracing::debug!(bytes = input.len(), strict = options.strict, "parsing OTSL table");
    let content = strip_wrapper(input, options.strict)?;
    let mut rest: &str = &content;

    let caption = extract_caption(&mut rest);
    let (has_thead, has_tbody, has_tfoot, tfoot_rows) = extract_flags(&mut rest);
    strip_location_tags(&mut rest);

    let mut row_strs: Vec<&str> = rest.split("<nl>").collect();
    while matches!(row_strs.last(), Some(s) if s.trim().is_empty()) {
        row_strs.pop();
    }

    if row_strs.is_empty() {
        return if options.strict {
            Err(TableIrError::EmptyTable)
        } else {
            let mut table = TableStructure::new(1, 1);
            table.cells.push(Cell::empty(0, 0));
            table.caption = caption;
            Ok(table)
        };
    }

    let mut rows: Vec<Vec<OtslToken>> = row_strs.iter().map(|r| tokenize_row(r)).collect();

    let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if !options.strict {
        for row in &mut rows {
            match row.len().cmp(&num_cols) {
                std::cmp::Ordering::Less => row.resize_with(num_cols, OtslToken::empty_cell),
                std::cmp::Ordering::Greater => row.truncate(num_cols),
                std::cmp::Ordering::Equal => {}
            }
        }
    }
    let num_rows = rows.len();

    let mut table = TableStructure::new(num_rows, num_cols);
    table.caption = caption;
    table.has_explicit_thead = has_thead;
    table.has_explicit_tbody = has_tbody;
    table.has_explicit_tfoot = has_tfoot;
    table.tfoot_rows = tfoot_rows;

    let mut grid: Vec<Vec<Option<usize>>> = vec![vec![None; num_cols]; num_rows];

    for (row_idx, row) in rows.iter().enumerate() {
        let mut tag_idx = 0usize;
        let mut grid_col = 0usize;

        while tag_idx < row.len() {
            let token = &row[tag_idx];

            if token.is_continuation() {
                tag_idx += 1;
                grid_col += 1;
                continue;
            }

            while grid_col < num_cols && grid[row_idx].get(grid_col).copied().flatten().is_some() {
                grid_col += 1;
            }
            if grid_col >= num_cols {
                break;
            }

            let colspan = compute_colspan(row, tag_idx);
            let rowspan = compute_rowspan(&rows, row_idx, tag_idx);

            let (content, header_type) = match token {
                OtslToken::Filled(text) => (build_content(text, options), HeaderType::None),
                OtslToken::ColHeader(text) => (build_content(text, options), HeaderType::Column),
                OtslToken::RowHeader(text) => (build_content(text, options), HeaderType::Row),
                OtslToken::Empty => (CellContent::default(), HeaderType::None),
                _ => unreachable!("continuation tokens are handled above"),
            };

            let cell = Cell {
                row: row_idx,
                col: grid_col,
                rowspan,
                colspan,
                content,
                is_header: header_type != HeaderType::None,
                header_type,
            };

            let cell_idx = table.cells.len();
            for r in row_idx..(row_idx + rowspan).min(num_rows) {
                for c in grid_col..(grid_col + colspan).min(num_cols) {
                    grid[r][c] = Some(cell_idx);
                }
            }
            table.cells.push(cell);

            grid_col += colspan;
            tag_idx += colspan;
        }
    }

    Ok(table)
}

const INLINE_MARKUP_TAGS: [&str; 9] =
    ["sup", "sub", "b", "i", "strong", "em", "u", "span", "a"];

/// OTSL content text can itself carry raw inline HTML that must not be
/// misread as an OTSL tag. Unlike the HTML parser, there is no DOM to walk
/// here, so this is a plain substring check over the known tag set.
fn text_has_inline_markup(text: &str) -> bool {
    INLINE_MARKUP_TAGS.iter().any(|tag| text.contains(&format!("<{tag}>")) || text.contains(&format!("<{tag} ")))
}

fn build_content(text: &str, options: &ConversionOptions) -> CellContent {
    let formulas = if options.preserve_latex {
        latex::tag_formulas(text)
    } else {
        Vec::new()
    };
    CellContent {
        text: text.to_string(),
        formulas,
        has_math_tags: text_has_inline_markup(text),
    }
}

fn strip_wrapper(input: &str, strict: bool) -> Result<String> {
    let trimmed = input.trim();
    if strict {
        if !trimmed.starts_with(WRAPPER_OPEN) || !trimmed.ends_with(WRAPPER_CLOSE) {
            return Err(TableIrError::MalformedOtsl(
                "missing <otsl>/</otsl> wrapper".to_string(),
            ));
        }
        Ok(trimmed[WRAPPER_OPEN.len()..trimmed.len() - WRAPPER_CLOSE.len()].to_string())
    } else {
        let mut owned = trimmed.to_string();
        if !owned.starts_with(WRAPPER_OPEN) {
            owned = format!("{WRAPPER_OPEN}{owned}");
        }
        if !owned.ends_with(WRAPPER_CLOSE) {
            owned.push_str(WRAPPER_CLOSE);
        }
        Ok(owned[WRAPPER_OPEN.len()..owned.len() - WRAPPER_CLOSE.len()].to_string())
    }
}

fn extract_caption(rest: &mut &str) -> Option<String> {
    let caps = CAPTION_RE.captures(rest)?;
    let whole = caps.get(0)?;
    let text = caps.get(1)?.as_str().trim().to_string();
    *rest = &rest[whole.end()..];
    if text.is_empty() { None } else { Some(text) }
}

fn extract_flags(rest: &mut &str) -> (bool, bool, bool, Vec<usize>) {
    let mut has_thead = false;
    let mut has_tbody = false;
    let mut has_tfoot = false;
    let mut tfoot_rows = Vec::new();

    if let Some(r) = rest.strip_prefix("<has_thead>") {
        has_thead = true;
        *rest = r;
    }
    if let Some(r) = rest.strip_prefix("<has_tbody>") {
        has_tbody = true;
        *rest = r;
    }
    if let Some(r) = rest.strip_prefix("<has_tfoot>") {
        has_tfoot = true;
        *rest = r;
        if let Some(caps) = TFOOT_ROWS_RE.captures(rest) {
            let whole = caps.get(0).unwrap();
            let list = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
            tfoot_rows = list
                .split(',')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse::<usize>().ok())
                .collect();
            *rest = &rest[whole.end()..];
        }
    }

    (has_thead, has_tbody, has_tfoot, tfoot_rows)
}

fn strip_location_tags(rest: &mut &str) {
    if let Some(m) = LOC_RUN_RE.find(rest) {
        *rest = &rest[m.end()..];
    }
}

fn tokenize_row(row_str: &str) -> Vec<OtslToken> {
    CELL_TOKEN_RE
        .captures_iter(row_str)
        .map(|caps| {
            let tag = caps.get(1).unwrap().as_str();
            let text = caps.get(2).map(|g| g.as_str()).unwrap_or_default().to_string();
            match tag {
                "fcel" => OtslToken::Filled(text),
                "ecel" => OtslToken::Empty,
                "ched" => OtslToken::ColHeader(text),
                "rhed" => OtslToken::RowHeader(text),
                "lcel" => OtslToken::ContLeft,
                "ucel" => OtslToken::ContUp,
                "xcel" => OtslToken::ContCross,
                _ => unreachable!("regex only captures the seven known tag names"),
            }
        })
        .collect()
}

fn compute_colspan(row: &[OtslToken], tag_idx: usize) -> usize {
    let mut span = 1;
    let mut i = tag_idx + 1;
    while i < row.len() && row[i].continues_left() {
        span += 1;
        i += 1;
    }
    span
}

fn compute_rowspan(rows: &[Vec<OtslToken>], start_row: usize, tag_idx: usize) -> usize {
    let mut span = 1;
    let mut r = start_row + 1;
    while r < rows.len() {
        match rows[r].get(tag_idx) {
            Some(t) if t.continues_up() => {
                span += 1;
                r += 1;
            }
            _ => break,
        }
    }
    span
}
