//! HTML string -> [`TableStructure`] parsing.
//!
//! Cells are built in a single left-to-right, top-to-bottom pass over the
//! unfiltered DOM row list so rowspan arithmetic always sees the row
//! indices the markup actually used; empty-row removal and gap filling are
//! later, lenient-only adjustment passes over the resulting cell list, not
//! part of cell construction itself.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, TableIrError};
use crate::latex;
use crate::types::{Cell, CellContent, ConversionOptions, HeaderType, TableStructure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Thead,
    Tbody,
    Tfoot,
}

struct RawCell {
    row: usize,
    col: usize,
    rowspan: usize,
    colspan: usize,
    content: CellContent,
    is_th: bool,
    section: Section,
}

/// Parse the first `<table>` found in `input` into a [`TableStructure`].
pub fn parse(input: &str, options: &ConversionOptions) -> Result<TableStructure> {
    tracing::debug!(bytes = input.len(), strict = options.strict, "parsing HTML table");
    let table_sel = Selector::parse("table").expect("static selector");

    let primary_doc = Html::parse_document(input);
    let mut found_table = false;
    let mut table = match primary_doc.select(&table_sel).next() {
        Some(el) => {
            found_table = true;
            Some(build_table(el, options)?)
        }
        None => None,
    };

    if table.as_ref().map(|t| t.num_rows == 0).unwrap_or(true) {
        tracing::debug!("primary parse found no rows, retrying with forgiving fragment parser");
        let fallback_doc = Html::parse_fragment(input);
        if let Some(el) = fallback_doc.select(&table_sel).next() {
            found_table = true;
            table = Some(build_table(el, options)?);
        }
    }

    match table {
        Some(t) if t.num_rows > 0 => Ok(t),
        _ => {
            if options.strict {
                if found_table {
                    tracing::warn!("table found but has no rows, even after fallback");
                    Err(TableIrError::EmptyTable)
                } else {
                    tracing::warn!("no <table> element found in input");
                    Err(TableIrError::NoTableFound)
                }
            } else {
                tracing::debug!("lenient mode: falling back to a minimal 1x1 empty table");
                let mut minimal = TableStructure::new(1, 1);
                minimal.cells.push(Cell::empty(0, 0));
                Ok(minimal)
            }
        }
    }
}

fn build_table(table_el: ElementRef, options: &ConversionOptions) -> Result<TableStructure> {
    let caption = extract_caption(table_el);
    let has_border = has_border(table_el);

    let has_explicit_thead = !direct_children(table_el, "thead").is_empty();
    let has_explicit_tbody = !direct_children(table_el, "tbody").is_empty();
    let has_explicit_tfoot = !direct_children(table_el, "tfoot").is_empty();

    let thead_rows = direct_children(table_el, "thead")
        .into_iter()
        .next()
        .map(|t| direct_children(t, "tr"))
        .unwrap_or_default();
    let tbody_rows = match direct_children(table_el, "tbody").into_iter().next() {
        Some(tbody) => direct_children(tbody, "tr"),
        None => direct_children(table_el, "tr"),
    };
    let tfoot_rows_elems = direct_children(table_el, "tfoot")
        .into_iter()
        .next()
        .map(|t| direct_children(t, "tr"))
        .unwrap_or_default();

    let mut row_sections: Vec<(ElementRef, Section)> = Vec::new();
    row_sections.extend(thead_rows.into_iter().map(|r| (r, Section::Thead)));
    row_sections.extend(tbody_rows.into_iter().map(|r| (r, Section::Tbody)));
    row_sections.extend(tfoot_rows_elems.into_iter().map(|r| (r, Section::Tfoot)));

    if row_sections.is_empty() {
        let mut table = TableStructure::new(0, 0);
        table.caption = caption;
        table.has_border = has_border;
        table.has_explicit_thead = has_explicit_thead;
        table.has_explicit_tbody = has_explicit_tbody;
        table.has_explicit_tfoot = has_explicit_tfoot;
        return Ok(table);
    }

    let num_rows_initial = row_sections.len();
    let num_cols = row_sections
        .iter()
        .map(|(row, _)| {
            direct_cell_children(*row)
                .iter()
                .map(|c| sanitize_span(c, "colspan"))
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0);

    let raw_cells = build_raw_cells(&row_sections, num_rows_initial, num_cols, options)?;
    let raw_cells = promote_row_zero_headers(raw_cells, has_explicit_thead);

    let mut cells: Vec<Cell> = raw_cells
        .into_iter()
        .map(|raw| Cell {
            row: raw.row,
            col: raw.col,
            rowspan: raw.rowspan,
            colspan: raw.colspan,
            is_header: raw.is_th || raw.section == Section::Thead,
            header_type: classify_header(&raw, has_explicit_thead),
            content: raw.content,
        })
        .collect();

    let mut num_rows = num_rows_initial;
    let is_empty_row = |idx: usize| {
        let (row_el, _) = row_sections[idx];
        direct_cell_children(row_el).is_empty()
    };

    let mut tfoot_row_indices: Vec<usize> = row_sections
        .iter()
        .enumerate()
        .filter(|(_, (_, section))| *section == Section::Tfoot)
        .map(|(idx, _)| idx)
        .collect();

    if !options.strict {
        let empty_rows: Vec<usize> = (0..num_rows_initial).filter(|&i| is_empty_row(i)).collect();
        if !empty_rows.is_empty() {
            let mut row_mapping: Vec<Option<usize>> = Vec::with_capacity(num_rows_initial);
            let mut next_idx = 0usize;
            for i in 0..num_rows_initial {
                if empty_rows.contains(&i) {
                    row_mapping.push(None);
                } else {
                    row_mapping.push(Some(next_idx));
                    next_idx += 1;
                }
            }

            cells.retain_mut(|cell| {
                let Some(new_row) = row_mapping[cell.row] else {
                    return false;
                };
                let removed_within_span = (cell.row..cell.row + cell.rowspan)
                    .filter(|r| empty_rows.contains(r))
                    .count();
                cell.rowspan = cell.rowspan.saturating_sub(removed_within_span).max(1);
                cell.row = new_row;
                true
            });

            tfoot_row_indices = tfoot_row_indices
                .into_iter()
                .filter_map(|i| row_mapping[i])
                .collect();

            num_rows = next_idx;
        }
    }

    if !options.strict {
        let mut table_shell = TableStructure::new(num_rows, num_cols);
        table_shell.cells = cells;
        let grid = table_shell.get_occupancy_grid();
        let mut gap_fills = Vec::new();
        for r in 0..num_rows {
            for c in 0..num_cols {
                if grid[r][c].is_none() {
                    gap_fills.push(Cell::empty(r, c));
                }
            }
        }
        cells = table_shell.cells;
        cells.extend(gap_fills);
    }

    let mut table = TableStructure::new(num_rows, num_cols);
    table.cells = cells;
    table.caption = caption;
    table.has_border = has_border;
    table.has_explicit_thead = has_explicit_thead;
    table.has_explicit_tbody = has_explicit_tbody;
    table.has_explicit_tfoot = has_explicit_tfoot;
    table.tfoot_rows = tfoot_row_indices;
    Ok(table)
}

/// Builds every cell's raw span data. In strict mode a `rowspan`/`colspan`
/// that would reach past the declared grid is a hard error
/// ([`TableIrError::SpanOutOfBounds`]) rather than silently clamped — lenient
/// mode is the only one that clamps a span exceeding the remaining rows or
/// columns down to what's left.
fn build_raw_cells(
    row_sections: &[(ElementRef, Section)],
    num_rows: usize,
    num_cols: usize,
    options: &ConversionOptions,
) -> Result<Vec<RawCell>> {
    let mut grid: Vec<Vec<bool>> = vec![vec![false; num_cols]; num_rows];
    let mut raw_cells = Vec::new();

    for (row_idx, (row_el, section)) in row_sections.iter().enumerate() {
        let mut col = 0usize;
        for cell_el in direct_cell_children(*row_el) {
            while col < num_cols && grid[row_idx][col] {
                col += 1;
            }
            if col >= num_cols {
                break;
            }

            let raw_rowspan = sanitize_span(&cell_el, "rowspan");
            let raw_colspan = sanitize_span(&cell_el, "colspan");
            let max_rowspan = num_rows - row_idx;
            let max_colspan = num_cols - col;

            if options.strict && (raw_rowspan > max_rowspan || raw_colspan > max_colspan) {
                return Err(TableIrError::SpanOutOfBounds {
                    row: row_idx,
                    col,
                    rowspan: raw_rowspan,
                    colspan: raw_colspan,
                    num_rows,
                    num_cols,
                });
            }

            let rowspan = raw_rowspan.min(max_rowspan).max(1);
            let colspan = raw_colspan.min(max_colspan).max(1);
            let is_th = cell_el.value().name() == "th";
            let has_markup = has_inline_markup(cell_el);
            let text = extract_cell_text(cell_el, has_markup);
            let content = build_content(&text, has_markup, options);

            for r in row_idx..(row_idx + rowspan).min(num_rows) {
                for c in col..(col + colspan).min(num_cols) {
                    grid[r][c] = true;
                }
            }

            raw_cells.push(RawCell {
                row: row_idx,
                col,
                rowspan,
                colspan,
                content,
                is_th,
                section: *section,
            });

            col += colspan;
        }
    }

    Ok(raw_cells)
}

/// Implements the "no explicit `<thead>` but row 0 is entirely headers"
/// rule by folding the row-level header derivation directly into each raw
/// cell rather than tracking a separate `column_headers` row-index set.
fn promote_row_zero_headers(mut raw_cells: Vec<RawCell>, has_explicit_thead: bool) -> Vec<RawCell> {
    if has_explicit_thead {
        return raw_cells;
    }
    let row_zero: Vec<&RawCell> = raw_cells.iter().filter(|c| c.row == 0).collect();
    let all_headers = !row_zero.is_empty() && row_zero.iter().all(|c| c.is_th);
    if all_headers {
        for cell in raw_cells.iter_mut().filter(|c| c.row == 0) {
            cell.section = Section::Thead;
        }
    }
    raw_cells
}

fn classify_header(raw: &RawCell, _has_explicit_thead: bool) -> HeaderType {
    if raw.section == Section::Thead {
        HeaderType::Column
    } else if raw.col == 0 && raw.is_th {
        HeaderType::Row
    } else {
        HeaderType::None
    }
}

fn build_content(text: &str, has_math_tags: bool, options: &ConversionOptions) -> CellContent {
    let formulas = if options.preserve_latex {
        latex::tag_formulas(text)
    } else {
        Vec::new()
    };
    CellContent {
        text: text.to_string(),
        formulas,
        has_math_tags,
    }
}

fn extract_caption(table_el: ElementRef) -> Option<String> {
    let caption_el = direct_children(table_el, "caption").into_iter().next()?;
    let text = caption_el.text().collect::<Vec<_>>().join(" ");
    let normalized = normalize_whitespace(&text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn has_border(table_el: ElementRef) -> bool {
    match table_el.value().attr("border") {
        Some(v) => v != "0",
        None => false,
    }
}

fn direct_children<'a>(el: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == tag)
        .collect()
}

fn direct_cell_children(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect()
}

fn sanitize_span(cell_el: &ElementRef, attr: &str) -> usize {
    cell_el
        .value()
        .attr(attr)
        .map(|raw| raw.replace(['\\', '"', '\''], ""))
        .and_then(|cleaned| cleaned.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

const INLINE_MARKUP_TAGS: [&str; 9] = ["sup", "sub", "b", "i", "strong", "em", "u", "span", "a"];

fn has_inline_markup(cell_el: ElementRef) -> bool {
    cell_el
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|e| INLINE_MARKUP_TAGS.contains(&e.value().name()))
}

fn extract_cell_text(cell_el: ElementRef, has_markup: bool) -> String {
    if has_markup {
        cell_el.inner_html().trim().to_string()
    } else {
        let text = cell_el.text().collect::<Vec<_>>().join(" ");
        normalize_whitespace(&text)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ConversionOptions {
        ConversionOptions::default()
    }

    #[test]
    fn parses_2x2_table() {
        let html = "<table border=\"1\"><tr><td>A</td><td>B</td></tr><tr><td>C</td><td>D</td></tr></table>";
        let table = parse(html, &opts()).unwrap();
        assert_eq!(table.num_rows, 2);
        assert_eq!(table.num_cols, 2);
        assert_eq!(table.cells.len(), 4);
        assert!(table.has_border);
        let (valid, errors) = table.validate();
        assert!(valid, "unexpected errors: {errors:?}");
    }

    #[test]
    fn th_in_thead_becomes_column_header() {
        let html = "<table><thead><tr><th>Name</th><th>Age</th></tr></thead><tbody><tr><td>A</td><td>1</td></tr></tbody></table>";
        let table = parse(html, &opts()).unwrap();
        assert!(table.has_explicit_thead);
        let header_cell = table.get_cell_at(0, 0).unwrap();
        assert_eq!(header_cell.header_type, HeaderType::Column);
    }

    #[test]
    fn no_table_is_strict_error() {
        let mut strict_opts = opts();
        strict_opts.strict = true;
        let result = parse("<p>no table here</p>", &strict_opts);
        assert!(matches!(result, Err(TableIrError::NoTableFound)));
    }

    #[test]
    fn lenient_mode_returns_minimal_table_when_absent() {
        let table = parse("<p>no table here</p>", &opts()).unwrap();
        assert_eq!(table.num_rows, 1);
        assert_eq!(table.num_cols, 1);
    }

    #[test]
    fn colspan_and_rowspan_are_sanitized_and_clamped() {
        let html = r#"<table><tr><td colspan="\"2\"">A</td></tr><tr><td>B</td><td>C</td></tr></table>"#;
        let table = parse(html, &opts()).unwrap();
        let origin = table.get_cell_at(0, 0).unwrap();
        assert_eq!(origin.colspan, 2);
    }

    #[test]
    fn empty_rows_are_removed_in_lenient_mode() {
        let html = "<table><tr><td>A</td></tr><tr></tr><tr><td>B</td></tr></table>";
        let table = parse(html, &opts()).unwrap();
        assert_eq!(table.num_rows, 2);
    }

    #[test]
    fn gap_filling_inserts_synthetic_empty_cells() {
        let html = r#"<table><tr><td colspan="2">A</td></tr><tr><td>B</td></tr></table>"#;
        let table = parse(html, &opts()).unwrap();
        let (valid, errors) = table.validate();
        assert!(valid, "unexpected errors: {errors:?}");
    }

    #[test]
    fn inline_markup_is_preserved_verbatim() {
        let html = "<table><tr><td>x<sup>2</sup></td></tr></table>";
        let table = parse(html, &opts()).unwrap();
        assert_eq!(table.cells[0].content.text, "x<sup>2</sup>");
        assert!(table.cells[0].content.has_math_tags);
    }

    #[test]
    fn plain_text_does_not_set_has_math_tags() {
        let html = "<table><tr><td>plain</td></tr></table>";
        let table = parse(html, &opts()).unwrap();
        assert!(!table.cells[0].content.has_math_tags);
    }

    #[test]
    fn strict_mode_rejects_span_exceeding_grid_bounds() {
        let html = r#"<table><tr><td rowspan="5">A</td></tr><tr><td>B</td></tr></table>"#;
        let mut strict_opts = opts();
        strict_opts.strict = true;
        let result = parse(html, &strict_opts);
        assert!(matches!(result, Err(TableIrError::SpanOutOfBounds { .. })));
    }

    #[test]
    fn row_zero_all_th_without_thead_is_promoted_to_column_header() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr><tr><td>A</td><td>1</td></tr></table>";
        let table = parse(html, &opts()).unwrap();
        assert!(!table.has_explicit_thead);
        let header_cell = table.get_cell_at(0, 0).unwrap();
        assert_eq!(header_cell.header_type, HeaderType::Column);
    }
}
