//! Error types for table-ir

/// Result type alias for table-ir operations
pub type Result<T> = std::result::Result<T, TableIrError>;

/// Main error type for table-ir
#[derive(Debug, thiserror::Error)]
pub enum TableIrError {
    /// No `<table>` element could be located in the input
    #[error("no table found in input")]
    NoTableFound,

    /// A table was found but contains zero rows (strict mode only)
    #[error("table has no rows")]
    EmptyTable,

    /// The HTML input could not be parsed at all, even by the fallback parser
    #[error("malformed HTML: {0}")]
    MalformedHtml(String),

    /// The OTSL input violates the token grammar
    #[error("malformed OTSL: {0}")]
    MalformedOtsl(String),

    /// A built or parsed `TableStructure` failed `validate()`
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A cell's row/col span would place it outside the table's declared bounds
    #[error(
        "span out of bounds: cell at ({row}, {col}) with rowspan {rowspan} colspan {colspan} exceeds {num_rows}x{num_cols} grid"
    )]
    SpanOutOfBounds {
        /// Cell row
        row: usize,
        /// Cell column
        col: usize,
        /// Cell rowspan
        rowspan: usize,
        /// Cell colspan
        colspan: usize,
        /// Table row count
        num_rows: usize,
        /// Table column count
        num_cols: usize,
    },
}

impl TableIrError {
    /// Create a validation failed error
    pub fn validation_failed<S: Into<String>>(reason: S) -> Self {
        Self::ValidationFailed(reason.into())
    }

    /// True for errors raised while locating or tokenizing input, before any
    /// `TableStructure` existed to validate.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NoTableFound
                | Self::EmptyTable
                | Self::MalformedHtml(_)
                | Self::MalformedOtsl(_)
        )
    }

    /// True for errors raised against an already-assembled `TableStructure`.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed(_) | Self::SpanOutOfBounds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_vs_validation_are_disjoint() {
        let structural = TableIrError::NoTableFound;
        assert!(structural.is_structural());
        assert!(!structural.is_validation());

        let validation = TableIrError::validation_failed("bad grid");
        assert!(validation.is_validation());
        assert!(!validation.is_structural());
    }

    #[test]
    fn display_messages_are_human_readable() {
        let err = TableIrError::SpanOutOfBounds {
            row: 2,
            col: 3,
            rowspan: 2,
            colspan: 1,
            num_rows: 3,
            num_cols: 3,
        };
        assert!(err.to_string().contains("(2, 3)"));
    }
}
