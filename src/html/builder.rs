//! [`TableStructure`] -> HTML string building.
//!
//! `scraper` has no write-side API, so output is assembled as plain strings,
//! mirroring the manual element-by-element emission the OTSL builder already
//! uses.

use crate::error::{Result, TableIrError};
use crate::latex;
use crate::types::{Cell, ConversionOptions, HeaderType, TableStructure};

/// Build an HTML `<table>` string from a table structure. Refuses to emit
/// for an invalid table, mapping `validate()` failures to
/// [`TableIrError::ValidationFailed`].
pub fn build(table: &TableStructure, options: &ConversionOptions) -> Result<String> {
    let (valid, errors) = table.validate();
    if !valid {
        tracing::warn!(?errors, "refusing to build HTML for an invalid table");
        return Err(TableIrError::validation_failed(errors.join("; ")));
    }
    tracing::debug!(rows = table.num_rows, cols = table.num_cols, "building HTML table");

    let mut out = String::new();
    if options.include_borders && table.has_border {
        out.push_str("<table border=\"1\">");
    } else {
        out.push_str("<table>");
    }

    if let Some(caption) = &table.caption {
        out.push_str(&format!("<caption>{caption}</caption>"));
    }

    let (thead_rows, tbody_rows, tfoot_rows) = organize_rows(table, options);

    if !thead_rows.is_empty() {
        out.push_str("<thead>");
        for row_idx in &thead_rows {
            build_row(&mut out, table, *row_idx, options);
        }
        out.push_str("</thead>");
    }

    out.push_str("<tbody>");
    for row_idx in &tbody_rows {
        build_row(&mut out, table, *row_idx, options);
    }
    out.push_str("</tbody>");

    if !tfoot_rows.is_empty() {
        out.push_str("<tfoot>");
        for row_idx in &tfoot_rows {
            build_row(&mut out, table, *row_idx, options);
        }
        out.push_str("</tfoot>");
    }

    out.push_str("</table>");
    Ok(out)
}

/// Partition row indices into thead/tbody/tfoot, in that emission order.
///
/// `force_first_row_thead` and `normalize_for_teds` are kept genuinely
/// distinct: the former only ever promotes row 0 into the header section
/// when nothing else already put it there; the latter additionally
/// guarantees a `<thead>` is emitted even for a table with no header cells
/// at all, by falling back to row 0 when the header set is empty.
fn organize_rows(
    table: &TableStructure,
    options: &ConversionOptions,
) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut thead_rows: Vec<usize> = (0..table.num_rows)
        .filter(|&r| row_is_column_header(table, r))
        .collect();

    if options.force_first_row_thead && !thead_rows.contains(&0) && table.num_rows > 0 {
        thead_rows.push(0);
        thead_rows.sort_unstable();
    }

    if options.normalize_for_teds && thead_rows.is_empty() && table.num_rows > 0 {
        thead_rows.push(0);
    }

    let tfoot_rows: Vec<usize> = table
        .tfoot_rows
        .iter()
        .copied()
        .filter(|r| !thead_rows.contains(r))
        .collect();

    let tbody_rows: Vec<usize> = (0..table.num_rows)
        .filter(|r| !thead_rows.contains(r) && !tfoot_rows.contains(r))
        .collect();

    (thead_rows, tbody_rows, tfoot_rows)
}

fn row_is_column_header(table: &TableStructure, row_idx: usize) -> bool {
    let row_cells: Vec<&Cell> = table.cells.iter().filter(|c| c.row == row_idx).collect();
    !row_cells.is_empty() && row_cells.iter().all(|c| c.header_type == HeaderType::Column)
}

fn build_row(out: &mut String, table: &TableStructure, row_idx: usize, options: &ConversionOptions) {
    out.push_str("<tr>");

    let mut row_cells: Vec<&Cell> = table.cells.iter().filter(|c| c.row == row_idx).collect();
    row_cells.sort_by_key(|c| c.col);

    for cell in row_cells {
        let tag = if cell.is_header || cell.header_type != HeaderType::None { "th" } else { "td" };

        let mut attrs = String::new();
        if cell.rowspan > 1 {
            attrs.push_str(&format!(" rowspan=\"{}\"", cell.rowspan));
        }
        if cell.colspan > 1 {
            attrs.push_str(&format!(" colspan=\"{}\"", cell.colspan));
        }

        out.push_str(&format!("<{tag}{attrs}>"));
        out.push_str(&render_cell_content(cell, options));
        out.push_str(&format!("</{tag}>"));
    }

    out.push_str("</tr>");
}

/// Cell text is emitted verbatim, never HTML-escaped: the parser already
/// hands back raw inline markup (`<sup>`, `<sub>`, ...) inside `text` for
/// cells that contained it, and escaping here would turn that markup back
/// into literal angle brackets instead of rendering it. Sanitizing cell
/// text against untrusted input is a deliberate non-goal here — callers
/// that need it apply their own layer downstream.
fn render_cell_content(cell: &Cell, options: &ConversionOptions) -> String {
    if options.preserve_latex || cell.content.formulas.is_empty() {
        cell.content.text.clone()
    } else {
        let mut text = cell.content.text.clone();
        for formula in &cell.content.formulas {
            let html_repr = latex::latex_to_html(&formula.original_text);
            text = text.replacen(&formula.original_text, &html_repr, 1);
        }
        text
    }
}
