//! End-to-end HTML <-> OTSL roundtrip tests.

use pretty_assertions::assert_eq;
use table_ir::{ConversionOptions, Converter};

#[test]
fn plain_grid_round_trips_through_otsl() {
    let converter = Converter::new(ConversionOptions::default());
    let html = "<table><tr><td>A</td><td>B</td></tr><tr><td>C</td><td>D</td></tr></table>";

    let otsl = converter.html_to_otsl(html).unwrap();
    let report = converter.validate_conversion(html, &otsl);
    assert!(report.is_valid, "{}", report.message);
}

#[test]
fn table_with_header_row_round_trips() {
    let converter = Converter::new(ConversionOptions::default());
    let html =
        "<table><thead><tr><th>Name</th><th>Age</th></tr></thead><tbody><tr><td>A</td><td>1</td></tr></tbody></table>";

    let (otsl, reconstructed, _) = converter.roundtrip_html(html).unwrap();
    assert!(otsl.contains("<has_thead>"));
    assert!(reconstructed.contains("<thead>"));
    assert!(reconstructed.contains("<th>Name</th>"));
}

#[test]
fn colspan_and_rowspan_survive_round_trip() {
    let converter = Converter::new(ConversionOptions::default());
    let html = r#"<table>
        <tr><td colspan="2">Header</td></tr>
        <tr><td rowspan="2">Left</td><td>Right1</td></tr>
        <tr><td>Right2</td></tr>
    </table>"#;

    let ir = converter.html_to_ir(html).unwrap();
    let (valid, errors) = ir.validate();
    assert!(valid, "unexpected errors: {errors:?}");

    let otsl = converter.ir_to_otsl(&ir).unwrap();
    let ir_back = converter.otsl_to_ir(&otsl).unwrap();
    assert_eq!(ir.num_rows, ir_back.num_rows);
    assert_eq!(ir.num_cols, ir_back.num_cols);
    assert_eq!(ir.cells.len(), ir_back.cells.len());
}

#[test]
fn otsl_round_trips_back_through_html() {
    let converter = Converter::new(ConversionOptions::default());
    let otsl = "<otsl><has_thead><ched>Name<ched>Age<nl><fcel>A<fcel>1<nl></otsl>";

    let (html, reconstructed, _) = converter.roundtrip_otsl(otsl).unwrap();
    assert!(html.contains("<th>Name</th>"));
    assert!(reconstructed.contains("<ched>Name"));
}

#[test]
fn caption_and_latex_formula_survive_round_trip() {
    let converter = Converter::new(ConversionOptions::default());
    let html = "<table><caption>Results</caption><tr><td>$x^2 + 1$</td></tr></table>";

    let ir = converter.html_to_ir(html).unwrap();
    assert_eq!(ir.caption.as_deref(), Some("Results"));
    assert_eq!(ir.cells[0].content.formulas.len(), 1);

    let otsl = converter.ir_to_otsl(&ir).unwrap();
    assert!(otsl.contains("<caption>Results</caption>"));
    assert!(otsl.contains("$x^2 + 1$"));
}

#[test]
fn tfoot_rows_survive_round_trip() {
    let converter = Converter::new(ConversionOptions::default());
    let html =
        "<table><tbody><tr><td>A</td></tr></tbody><tfoot><tr><td>Total</td></tr></tfoot></table>";

    let ir = converter.html_to_ir(html).unwrap();
    assert!(ir.has_explicit_tfoot);
    assert_eq!(ir.tfoot_rows, vec![1]);

    let otsl = converter.ir_to_otsl(&ir).unwrap();
    assert!(otsl.contains("<has_tfoot>"));
    assert!(otsl.contains("<tfoot_rows>1</tfoot_rows>"));
}

#[test]
fn deterministic_location_tags_do_not_change_structure() {
    let mut options = ConversionOptions::default();
    options.include_location = true;
    options.location_seed = Some(7);
    let converter = Converter::new(options);

    let html = "<table><tr><td>A</td></tr></table>";
    let otsl_first = converter.html_to_otsl(html).unwrap();
    let otsl_second = converter.html_to_otsl(html).unwrap();
    assert_eq!(otsl_first, otsl_second);

    let ir = converter.otsl_to_ir(&otsl_first).unwrap();
    assert_eq!(ir.num_rows, 1);
    assert_eq!(ir.num_cols, 1);
}
