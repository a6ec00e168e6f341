//! Core intermediate representation (IR) for table structures
//!
//! The IR is the single point of contact between the HTML side of this
//! crate and the OTSL side: parsers only ever produce a [`TableStructure`],
//! and builders only ever consume one. Parsers never call builders and
//! builders never call parsers directly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single LaTeX formula detected inside cell text.
///
/// `start`/`end` are byte offsets into the text the formula was extracted
/// from, so callers can reconstruct the original string by splicing
/// `original_text` back into place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// The verbatim source text, including delimiters (`$...$`, `\(...\)`, etc).
    pub original_text: String,
    /// The formula content with delimiters stripped.
    pub latex_content: String,
    /// Which delimiter convention matched.
    pub kind: FormulaKind,
    /// Byte offset of `original_text`'s first byte in the source string.
    pub start: usize,
    /// Byte offset one past `original_text`'s last byte in the source string.
    pub end: usize,
}

/// The delimiter convention a [`Formula`] was detected under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaKind {
    /// `$$...$$`
    Display,
    /// `$...$`
    Inline,
    /// `<math>...</math>` / `<formula>...</formula>` / `<equation>...</equation>` tag wrapping
    Tag,
    /// `<sup>...</sup>`
    TagSup,
    /// `<sub>...</sub>`
    TagSub,
}

/// The content of a single cell: plain text plus any LaTeX formulas detected
/// inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CellContent {
    /// The cell's text, with formulas left in place (not stripped out).
    pub text: String,
    /// Formulas detected within `text`, in left-to-right order, non-overlapping.
    pub formulas: Vec<Formula>,
    /// Whether `text` is raw inline markup (`<sup>`, `<math>`, ...) carried
    /// verbatim from the source rather than whitespace-normalized plain
    /// text. Builders use this to know the text must never be re-escaped.
    pub has_math_tags: bool,
}

impl CellContent {
    /// Build a content block with no formulas and no preserved markup.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formulas: Vec::new(),
            has_math_tags: false,
        }
    }

    /// A cell is empty when its text is empty or whitespace-only, regardless
    /// of whether formulas were detected (a formula-only cell is never
    /// considered empty since formula text is non-whitespace).
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What kind of header a [`Cell`] behaves as, if any.
///
/// Modeled as a sum type rather than `Option<String>`: a cell is either a
/// column header, a row header, or neither, never both heuristics blended
/// together. See the HTML parser's header derivation for the "column wins
/// over row" tie-break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HeaderType {
    /// Not a header cell.
    #[default]
    None,
    /// Acts as a column header (its text labels the column below it).
    Column,
    /// Acts as a row header (its text labels the row to its right).
    Row,
}

/// A single cell in a [`TableStructure`]'s grid.
///
/// `row`/`col` give the cell's origin (its top-left occupied position);
/// `rowspan`/`colspan` (both >= 1) extend from there. Continuation
/// positions covered by the span are not separate `Cell`s — they are
/// derived by [`TableStructure::get_occupancy_grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Origin row index (0-based).
    pub row: usize,
    /// Origin column index (0-based).
    pub col: usize,
    /// Number of rows this cell spans, minimum 1.
    pub rowspan: usize,
    /// Number of columns this cell spans, minimum 1.
    pub colspan: usize,
    /// The cell's text and formulas. Empty cells are still real `Cell`
    /// values with empty content, never omitted from the grid.
    pub content: CellContent,
    /// Whether the source marked this cell as a header (HTML `<th>`, or any
    /// cell - `<td>` included - inside a `<thead>` section). Independent of
    /// `header_type`: a `<th>` that is neither in a header row nor the row's
    /// first column is still `is_header == true` with `header_type ==
    /// HeaderType::None`.
    pub is_header: bool,
    /// Whether this cell behaves as a column header or row header, if either.
    pub header_type: HeaderType,
}

impl Cell {
    /// Build a 1x1 cell with no span and no header role.
    pub fn new(row: usize, col: usize, content: CellContent) -> Self {
        Self {
            row,
            col,
            rowspan: 1,
            colspan: 1,
            content,
            is_header: false,
            header_type: HeaderType::None,
        }
    }

    /// A synthetic empty 1x1 cell, used by lenient-mode gap filling.
    pub fn empty(row: usize, col: usize) -> Self {
        Self::new(row, col, CellContent::default())
    }

    /// True if `(r, c)` falls within this cell's rowspan/colspan rectangle.
    pub fn occupies_position(&self, r: usize, c: usize) -> bool {
        r >= self.row && r < self.row + self.rowspan && c >= self.col && c < self.col + self.colspan
    }

    /// Every `(row, col)` position this cell's span covers, origin included.
    pub fn get_occupied_positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::with_capacity(self.rowspan * self.colspan);
        for r in self.row..self.row + self.rowspan {
            for c in self.col..self.col + self.colspan {
                positions.push((r, c));
            }
        }
        positions
    }

    /// Classify this cell's span shape: plain origin, colspan-only,
    /// rowspan-only, both, or an empty 1x1 cell.
    pub fn span_type(&self) -> CellSpanType {
        match (self.rowspan > 1, self.colspan > 1) {
            (false, false) if self.content.is_empty() => CellSpanType::Empty,
            (false, false) => CellSpanType::Origin,
            (false, true) => CellSpanType::Colspan,
            (true, false) => CellSpanType::Rowspan,
            (true, true) => CellSpanType::Both,
        }
    }

    /// Classify this cell's span shape as seen from one of its occupied
    /// positions, rather than from its overall shape: a position only picks
    /// up the dimension(s) that actually moved to reach it, so a position in
    /// the same row as the origin is a colspan continuation even if the
    /// cell also has a rowspan (and vice versa). `(row, col)` must be a
    /// position this cell occupies.
    pub fn span_type_at(&self, row: usize, col: usize) -> CellSpanType {
        match (row > self.row, col > self.col) {
            (false, false) => self.span_type(),
            (false, true) => CellSpanType::Colspan,
            (true, false) => CellSpanType::Rowspan,
            (true, true) => CellSpanType::Both,
        }
    }
}

/// The shape of a cell's span, used to drive OTSL token selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSpanType {
    /// No span, non-empty content.
    Origin,
    /// `colspan > 1`, `rowspan == 1`.
    Colspan,
    /// `rowspan > 1`, `colspan == 1`.
    Rowspan,
    /// `rowspan > 1` and `colspan > 1`.
    Both,
    /// No span, empty content.
    Empty,
}

/// A complete table: dimensions, cells, and the section/caption metadata
/// needed to round-trip between HTML and OTSL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    /// Total number of grid rows.
    pub num_rows: usize,
    /// Total number of grid columns.
    pub num_cols: usize,
    /// Every cell in the table, in no particular required order.
    pub cells: Vec<Cell>,
    /// Optional caption text.
    pub caption: Option<String>,
    /// Whether the source declared an explicit `<thead>` (HTML) or
    /// `<has_thead>` (OTSL) section.
    pub has_explicit_thead: bool,
    /// Whether the source declared an explicit `<tbody>` / `<has_tbody>`.
    pub has_explicit_tbody: bool,
    /// Whether the source declared an explicit `<tfoot>` / `<has_tfoot>`.
    pub has_explicit_tfoot: bool,
    /// Row indices that belong to the table footer, sorted ascending.
    pub tfoot_rows: Vec<usize>,
    /// Whether the source table had a visible border (HTML `border` attribute).
    pub has_border: bool,
}

impl TableStructure {
    /// Build an empty table shell with the given dimensions and no cells.
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            cells: Vec::new(),
            caption: None,
            has_explicit_thead: false,
            has_explicit_tbody: false,
            has_explicit_tfoot: false,
            tfoot_rows: Vec::new(),
            has_border: false,
        }
    }

    /// The cell whose span covers `(row, col)`, if any.
    pub fn get_cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.iter().find(|c| c.occupies_position(row, col))
    }

    /// The origin `(row, col)` of the cell covering `(row, col)`, if any.
    pub fn get_cell_origin_at(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        self.get_cell_at(row, col).map(|c| (c.row, c.col))
    }

    /// Derive the occupancy grid: `grid[r][c]` is `Some(cell_index)` when a
    /// cell's span covers `(r, c)`, `None` when no cell covers it (a gap).
    ///
    /// This is always computed on demand from `cells`, never stored on the
    /// struct, so it can never drift out of sync with the cell list.
    pub fn get_occupancy_grid(&self) -> Vec<Vec<Option<usize>>> {
        let mut grid = vec![vec![None; self.num_cols]; self.num_rows];
        for (idx, cell) in self.cells.iter().enumerate() {
            for (r, c) in cell.get_occupied_positions() {
                if r < self.num_rows && c < self.num_cols {
                    grid[r][c] = Some(idx);
                }
            }
        }
        grid
    }

    /// Classify the span shape of the cell covering `(row, col)`.
    pub fn get_cell_span_type(&self, row: usize, col: usize) -> Option<CellSpanType> {
        self.get_cell_at(row, col).map(|c| c.span_type())
    }

    /// Check every structural invariant, returning the full list of
    /// violations rather than stopping at the first one.
    ///
    /// Checked: non-degenerate dimensions (`num_rows >= 1`, `num_cols >= 1`,
    /// at least one cell), cell bounds within the declared grid,
    /// rowspan/colspan >= 1, complete occupancy (no gaps, no overlaps), and
    /// `tfoot_rows` indices within `num_rows`.
    pub fn validate(&self) -> (bool, Vec<String>) {
        let mut errors = Vec::new();

        if self.num_rows == 0 {
            errors.push("table has num_rows = 0".to_string());
        }
        if self.num_cols == 0 {
            errors.push("table has num_cols = 0".to_string());
        }
        if self.cells.is_empty() {
            errors.push("table has no cells".to_string());
        }

        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.rowspan == 0 || cell.colspan == 0 {
                errors.push(format!(
                    "cell {idx} at ({}, {}) has zero span (rowspan={}, colspan={})",
                    cell.row, cell.col, cell.rowspan, cell.colspan
                ));
            }
            if cell.row + cell.rowspan > self.num_rows || cell.col + cell.colspan > self.num_cols {
                errors.push(format!(
                    "cell {idx} at ({}, {}) with rowspan={} colspan={} exceeds {}x{} grid",
                    cell.row, cell.col, cell.rowspan, cell.colspan, self.num_rows, self.num_cols
                ));
            }
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut covered: HashSet<(usize, usize)> = HashSet::new();
        for cell in &self.cells {
            for pos in cell.get_occupied_positions() {
                if !seen.insert(pos) {
                    errors.push(format!("position {pos:?} is covered by more than one cell"));
                }
                covered.insert(pos);
            }
        }
        for r in 0..self.num_rows {
            for c in 0..self.num_cols {
                if !covered.contains(&(r, c)) {
                    errors.push(format!("position ({r}, {c}) is not covered by any cell"));
                }
            }
        }

        for &r in &self.tfoot_rows {
            if r >= self.num_rows {
                errors.push(format!("tfoot row index {r} out of bounds ({} rows)", self.num_rows));
            }
        }

        (errors.is_empty(), errors)
    }
}

/// Knobs controlling both parsing leniency and builder output shape.
///
/// See the crate's module docs for what each option does; this is the
/// single configuration surface shared by every parser/builder pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Detect and tag LaTeX formulas inside cell text.
    pub preserve_latex: bool,
    /// Reject malformed input instead of recovering from it.
    pub strict: bool,
    /// Emit `<loc_N>` placeholder location tokens when building OTSL.
    pub include_location: bool,
    /// Emit a `border="1"` attribute when building HTML.
    pub include_borders: bool,
    /// Force a `<thead>`/row-0-as-header shape even when no header was detected.
    pub normalize_for_teds: bool,
    /// Force row 0 into the header section regardless of header detection.
    pub force_first_row_thead: bool,
    /// Seed for the `<loc_N>` placeholder generator; `None` uses a fresh
    /// source of entropy, `Some(seed)` makes output byte-for-byte reproducible.
    pub location_seed: Option<u64>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            preserve_latex: true,
            strict: false,
            include_location: false,
            include_borders: false,
            normalize_for_teds: false,
            force_first_row_thead: false,
            location_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_occupies_its_full_span() {
        let cell = Cell {
            row: 1,
            col: 1,
            rowspan: 2,
            colspan: 3,
            content: CellContent::new("x"),
            is_header: false,
            header_type: HeaderType::None,
        };
        assert!(cell.occupies_position(1, 1));
        assert!(cell.occupies_position(2, 3));
        assert!(!cell.occupies_position(3, 1));
        assert!(!cell.occupies_position(1, 4));
        assert_eq!(cell.get_occupied_positions().len(), 6);
    }

    #[test]
    fn empty_content_is_empty() {
        assert!(CellContent::new("   ").is_empty());
        assert!(CellContent::new("").is_empty());
        assert!(!CellContent::new("x").is_empty());
    }

    #[test]
    fn validate_catches_gaps_and_overlaps() {
        let mut table = TableStructure::new(2, 2);
        table.cells.push(Cell::new(0, 0, CellContent::new("a")));
        table.cells.push(Cell::new(0, 0, CellContent::new("b")));
        let (valid, errors) = table.validate();
        assert!(!valid);
        assert!(errors.iter().any(|e| e.contains("more than one cell")));
        assert!(errors.iter().any(|e| e.contains("not covered")));
    }

    #[test]
    fn validate_passes_on_full_coverage() {
        let mut table = TableStructure::new(1, 2);
        table.cells.push(Cell::new(0, 0, CellContent::new("a")));
        table.cells.push(Cell::new(0, 1, CellContent::new("b")));
        let (valid, errors) = table.validate();
        assert!(valid, "unexpected errors: {errors:?}");
    }

    #[test]
    fn validate_rejects_degenerate_table() {
        let table = TableStructure::new(0, 0);
        let (valid, errors) = table.validate();
        assert!(!valid);
        assert!(errors.iter().any(|e| e.contains("num_rows = 0")));
        assert!(errors.iter().any(|e| e.contains("num_cols = 0")));
        assert!(errors.iter().any(|e| e.contains("no cells")));
    }

    #[test]
    fn occupancy_grid_reflects_spans() {
        let mut table = TableStructure::new(2, 2);
        table.cells.push(Cell {
            row: 0,
            col: 0,
            rowspan: 2,
            colspan: 1,
            content: CellContent::new("a"),
            is_header: false,
            header_type: HeaderType::None,
        });
        table.cells.push(Cell::new(0, 1, CellContent::new("b")));
        table.cells.push(Cell::new(1, 1, CellContent::new("c")));
        let grid = table.get_occupancy_grid();
        assert_eq!(grid[0][0], grid[1][0]);
        assert_ne!(grid[0][1], grid[1][1]);
    }
}
