//! High-level façade tying the HTML and OTSL parser/builder pairs together.
//!
//! [`Converter`] never parses or builds anything itself; every method is a
//! one- or two-line pipeline through [`crate::html`] and [`crate::otsl`].

use crate::error::Result;
use crate::html;
use crate::otsl;
use crate::types::{ConversionOptions, TableStructure};

/// Bidirectional HTML <-> OTSL conversion, configured once via
/// [`ConversionOptions`] and reused across calls.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
}

/// The outcome of comparing two [`TableStructure`]s parsed from different
/// sources, e.g. to check that an HTML table and an OTSL string describe
/// the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// Whether every checked property matched.
    pub is_valid: bool,
    /// Human-readable summary: either confirmation or the first mismatch found.
    pub message: String,
}

impl Converter {
    /// Build a converter with the given options.
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    /// The options this converter was built with.
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Parse an HTML table into the intermediate representation.
    pub fn html_to_ir(&self, html: &str) -> Result<TableStructure> {
        html::parse(html, &self.options)
    }

    /// Parse an OTSL string into the intermediate representation.
    pub fn otsl_to_ir(&self, otsl: &str) -> Result<TableStructure> {
        otsl::parse(otsl, &self.options)
    }

    /// Build an HTML table from the intermediate representation.
    pub fn ir_to_html(&self, table: &TableStructure) -> Result<String> {
        html::build(table, &self.options)
    }

    /// Build an OTSL string from the intermediate representation.
    pub fn ir_to_otsl(&self, table: &TableStructure) -> Result<String> {
        otsl::build(table, &self.options)
    }

    /// Parse HTML, then immediately re-emit it as OTSL.
    pub fn html_to_otsl(&self, html: &str) -> Result<String> {
        let table = self.html_to_ir(html)?;
        self.ir_to_otsl(&table)
    }

    /// Parse OTSL, then immediately re-emit it as HTML.
    pub fn otsl_to_html(&self, otsl: &str) -> Result<String> {
        let table = self.otsl_to_ir(otsl)?;
        self.ir_to_html(&table)
    }

    /// HTML -> OTSL -> HTML roundtrip. Returns the intermediate OTSL, the
    /// reconstructed HTML, and a short summary of the IR passed through.
    pub fn roundtrip_html(&self, html: &str) -> Result<(String, String, String)> {
        let table = self.html_to_ir(html)?;
        let otsl = self.ir_to_otsl(&table)?;
        let reconstructed = self.otsl_to_html(&otsl)?;
        Ok((otsl, reconstructed, summarize(&table)))
    }

    /// OTSL -> HTML -> OTSL roundtrip. Returns the intermediate HTML, the
    /// reconstructed OTSL, and a short summary of the IR passed through.
    pub fn roundtrip_otsl(&self, otsl: &str) -> Result<(String, String, String)> {
        let table = self.otsl_to_ir(otsl)?;
        let html = self.ir_to_html(&table)?;
        let reconstructed = self.html_to_otsl(&html)?;
        Ok((html, reconstructed, summarize(&table)))
    }

    /// Parse both an HTML table and an OTSL string to IR and compare them
    /// cell by cell: row/column counts, cell count, each cell's position,
    /// span, and trimmed text. Stops at the first mismatch found.
    pub fn validate_conversion(&self, html: &str, otsl: &str) -> ConversionReport {
        let html_ir = match self.html_to_ir(html) {
            Ok(t) => t,
            Err(e) => return ConversionReport { is_valid: false, message: format!("HTML parse failed: {e}") },
        };
        let otsl_ir = match self.otsl_to_ir(otsl) {
            Ok(t) => t,
            Err(e) => return ConversionReport { is_valid: false, message: format!("OTSL parse failed: {e}") },
        };

        if html_ir.num_rows != otsl_ir.num_rows {
            return ConversionReport {
                is_valid: false,
                message: format!(
                    "row count mismatch: HTML={}, OTSL={}",
                    html_ir.num_rows, otsl_ir.num_rows
                ),
            };
        }
        if html_ir.num_cols != otsl_ir.num_cols {
            return ConversionReport {
                is_valid: false,
                message: format!(
                    "column count mismatch: HTML={}, OTSL={}",
                    html_ir.num_cols, otsl_ir.num_cols
                ),
            };
        }
        if html_ir.cells.len() != otsl_ir.cells.len() {
            return ConversionReport {
                is_valid: false,
                message: format!(
                    "cell count mismatch: HTML={}, OTSL={}",
                    html_ir.cells.len(),
                    otsl_ir.cells.len()
                ),
            };
        }

        let mut html_cells = html_ir.cells.clone();
        let mut otsl_cells = otsl_ir.cells.clone();
        html_cells.sort_by_key(|c| (c.row, c.col));
        otsl_cells.sort_by_key(|c| (c.row, c.col));

        for (html_cell, otsl_cell) in html_cells.iter().zip(otsl_cells.iter()) {
            if html_cell.row != otsl_cell.row || html_cell.col != otsl_cell.col {
                return ConversionReport {
                    is_valid: false,
                    message: format!(
                        "cell position mismatch: HTML=({}, {}), OTSL=({}, {})",
                        html_cell.row, html_cell.col, otsl_cell.row, otsl_cell.col
                    ),
                };
            }
            if html_cell.rowspan != otsl_cell.rowspan || html_cell.colspan != otsl_cell.colspan {
                return ConversionReport {
                    is_valid: false,
                    message: format!("cell span mismatch at ({}, {})", html_cell.row, html_cell.col),
                };
            }
            let html_text = html_cell.content.text.trim();
            let otsl_text = otsl_cell.content.text.trim();
            if html_text != otsl_text {
                return ConversionReport {
                    is_valid: false,
                    message: format!(
                        "content mismatch at ({}, {}): '{html_text}' != '{otsl_text}'",
                        html_cell.row, html_cell.col
                    ),
                };
            }
        }

        ConversionReport {
            is_valid: true,
            message: "conversion is valid - structures match".to_string(),
        }
    }
}

fn summarize(table: &TableStructure) -> String {
    format!("TableStructure({}x{}, {} cells)", table.num_rows, table.num_cols, table.cells.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_otsl_produces_expected_tokens() {
        let converter = Converter::default();
        let otsl = converter
            .html_to_otsl("<table><tr><td>A</td><td>B</td></tr></table>")
            .unwrap();
        assert!(otsl.starts_with("<otsl>"));
        assert!(otsl.contains("<fcel>A"));
        assert!(otsl.contains("<fcel>B"));
    }

    #[test]
    fn roundtrip_html_preserves_dimensions() {
        let converter = Converter::default();
        let html = "<table><tr><td>A</td><td>B</td></tr><tr><td>C</td><td>D</td></tr></table>";
        let (_, reconstructed, summary) = converter.roundtrip_html(html).unwrap();
        assert!(reconstructed.contains("<table>"));
        assert_eq!(summary, "TableStructure(2x2, 4 cells)");
    }

    #[test]
    fn roundtrip_otsl_preserves_dimensions() {
        let converter = Converter::default();
        let otsl = "<otsl><fcel>A<fcel>B<nl></otsl>";
        let (_, reconstructed, summary) = converter.roundtrip_otsl(otsl).unwrap();
        assert!(reconstructed.starts_with("<otsl>"));
        assert_eq!(summary, "TableStructure(1x2, 2 cells)");
    }

    #[test]
    fn validate_conversion_accepts_matching_structures() {
        let converter = Converter::default();
        let html = "<table><tr><td>A</td><td>B</td></tr></table>";
        let otsl = converter.html_to_otsl(html).unwrap();
        let report = converter.validate_conversion(html, &otsl);
        assert!(report.is_valid, "{}", report.message);
    }

    #[test]
    fn validate_conversion_detects_row_count_mismatch() {
        let converter = Converter::default();
        let html = "<table><tr><td>A</td></tr><tr><td>B</td></tr></table>";
        let otsl = "<otsl><fcel>A<nl></otsl>";
        let report = converter.validate_conversion(html, otsl);
        assert!(!report.is_valid);
        assert!(report.message.contains("row count mismatch"));
    }
}
