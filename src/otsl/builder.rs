//! [`TableStructure`] -> OTSL string building.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, TableIrError};
use crate::types::{CellSpanType, ConversionOptions, HeaderType, TableStructure};

/// Build an OTSL string from a table structure. Refuses to emit for an
/// invalid table, mapping `validate()` failures to [`TableIrError::ValidationFailed`].
pub fn build(table: &TableStructure, options: &ConversionOptions) -> Result<String> {
    let (valid, errors) = table.validate();
    if !valid {
        tracing::warn!(?errors, "refusing to build OTSL for an invalid table");
        return Err(TableIrError::validation_failed(errors.join("; ")));
    }
    tracing::debug!(rows = table.num_rows, cols = table.num_cols, "building OTSL");

    let mut out = String::from("<otsl>");

    if let Some(caption) = &table.caption {
        out.push_str(&format!("<caption>{caption}</caption>"));
    }

    if table.has_explicit_thead {
        out.push_str("<has_thead>");
    }
    if table.has_explicit_tbody {
        out.push_str("<has_tbody>");
    }
    if table.has_explicit_tfoot {
        out.push_str("<has_tfoot>");
        if !table.tfoot_rows.is_empty() {
            let mut sorted = table.tfoot_rows.clone();
            sorted.sort_unstable();
            let joined = sorted
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&format!("<tfoot_rows>{joined}</tfoot_rows>"));
        }
    }

    if options.include_location {
        out.push_str(&generate_location_tags(options.location_seed));
    }

    out.push_str(&build_table_content(table));
    out.push_str("</otsl>");

    Ok(out)
}

fn generate_location_tags(seed: Option<u64>) -> String {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let x = rng.gen_range(30..=200);
    let y = rng.gen_range(80..=300);
    let w = rng.gen_range(300..=800);
    let h = rng.gen_range(200..=600);
    format!("<loc_{x}><loc_{y}><loc_{w}><loc_{h}>")
}

fn build_table_content(table: &TableStructure) -> String {
    let grid = table.get_occupancy_grid();
    let mut out = String::new();

    for row_idx in 0..table.num_rows {
        for col_idx in 0..table.num_cols {
            let Some(cell_idx) = grid[row_idx][col_idx] else {
                out.push_str("<ecel>");
                continue;
            };
            let cell = &table.cells[cell_idx];

            if cell.row == row_idx && cell.col == col_idx {
                let (tag, content) = format_cell(cell);
                out.push_str(&format!("<{tag}>{content}"));
            } else {
                match cell.span_type_at(row_idx, col_idx) {
                    CellSpanType::Colspan => out.push_str("<lcel>"),
                    CellSpanType::Rowspan => out.push_str("<ucel>"),
                    CellSpanType::Both => out.push_str("<xcel>"),
                    CellSpanType::Origin | CellSpanType::Empty => {
                        unreachable!("non-origin position can only be covered by a spanning cell")
                    }
                }
            }
        }
        out.push_str("<nl>");
    }

    out
}

fn format_cell(cell: &crate::types::Cell) -> (&'static str, &str) {
    match cell.header_type {
        HeaderType::Column => ("ched", cell.content.text.as_str()),
        HeaderType::Row => ("rhed", cell.content.text.as_str()),
        HeaderType::None if !cell.content.is_empty() => ("fcel", cell.content.text.as_str()),
        HeaderType::None => ("ecel", ""),
    }
}
