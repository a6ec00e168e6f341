//! Integration tests for HTML -> IR parsing, covering section handling,
//! header derivation, and lenient-mode recovery beyond the parser's own
//! unit tests.

use table_ir::html;
use table_ir::types::{ConversionOptions, HeaderType};

fn opts() -> ConversionOptions {
    ConversionOptions::default()
}

#[test]
fn nested_table_inside_a_cell_does_not_confuse_direct_child_traversal() {
    let html_str = "<table><tr><td>Outer<table><tr><td>Inner</td></tr></table></td></tr></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    assert_eq!(table.num_rows, 1);
    assert_eq!(table.num_cols, 1);
}

#[test]
fn tbody_without_thead_has_no_header_promotion_when_row_zero_is_mixed() {
    let html_str = "<table><tr><th>Name</th><td>1</td></tr></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    assert!(!table.has_explicit_thead);
    assert_eq!(table.get_cell_at(0, 0).unwrap().header_type, HeaderType::None);
}

#[test]
fn row_header_column_is_tagged_per_cell() {
    let html_str = "<table><tr><th>Total</th><td>42</td></tr></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    assert_eq!(table.get_cell_at(0, 0).unwrap().header_type, HeaderType::Row);
}

#[test]
fn th_outside_thead_and_column_zero_stays_a_header() {
    let html_str = "<table><tr><td>A</td><th>B</th></tr></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    let cell = table.get_cell_at(0, 1).unwrap();
    assert!(cell.is_header);
    assert_eq!(cell.header_type, HeaderType::None);
}

#[test]
fn explicit_tfoot_rows_are_recorded() {
    let html_str = "<table><tbody><tr><td>A</td></tr></tbody><tfoot><tr><td>Sum</td></tr></tfoot></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    assert!(table.has_explicit_tfoot);
    assert_eq!(table.tfoot_rows, vec![1]);
}

#[test]
fn malformed_markup_recovers_via_fragment_fallback() {
    let html_str = "<table><tr><td>A<td>B</tr></table>";
    let table = html::parse(html_str, &opts()).unwrap();
    assert!(table.num_rows >= 1);
    let (valid, errors) = table.validate();
    assert!(valid, "unexpected errors: {errors:?}");
}

#[test]
fn strict_mode_rejects_entirely_empty_table() {
    let mut strict_opts = opts();
    strict_opts.strict = true;
    let result = html::parse("<table></table>", &strict_opts);
    assert!(result.is_err());
}

#[test]
fn rowspan_exceeding_table_height_is_clamped() {
    let html_str = r#"<table><tr><td rowspan="99">A</td></tr></table>"#;
    let table = html::parse(html_str, &opts()).unwrap();
    let cell = table.get_cell_at(0, 0).unwrap();
    assert_eq!(cell.rowspan, table.num_rows);
}
