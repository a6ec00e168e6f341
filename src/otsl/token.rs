//! The seven OTSL cell tokens plus the tag names used to spell them.

/// One OTSL cell token, with its carried text where the grammar allows one.
///
/// Continuation tokens (`ContLeft`/`ContUp`/`ContCross`) never carry text —
/// they only ever mark that a grid position is covered by a span whose
/// origin token appeared earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtslToken {
    /// `<fcel>` — filled data cell.
    Filled(String),
    /// `<ecel>` — empty data cell.
    Empty,
    /// `<ched>` — column header cell.
    ColHeader(String),
    /// `<rhed>` — row header cell.
    RowHeader(String),
    /// `<lcel>` — continues a colspan from the left.
    ContLeft,
    /// `<ucel>` — continues a rowspan from above.
    ContUp,
    /// `<xcel>` — continues both (corner of a 2-D span).
    ContCross,
}

impl OtslToken {
    /// The bare tag name (without angle brackets) this token is spelled with.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Filled(_) => "fcel",
            Self::Empty => "ecel",
            Self::ColHeader(_) => "ched",
            Self::RowHeader(_) => "rhed",
            Self::ContLeft => "lcel",
            Self::ContUp => "ucel",
            Self::ContCross => "xcel",
        }
    }

    /// True for `lcel`/`ucel`/`xcel`: tokens that mark a grid position as
    /// covered by an already-committed span rather than starting a new cell.
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::ContLeft | Self::ContUp | Self::ContCross)
    }

    /// True for `lcel`/`xcel`: continuations counted toward colspan lookahead.
    pub fn continues_left(&self) -> bool {
        matches!(self, Self::ContLeft | Self::ContCross)
    }

    /// True for `ucel`/`xcel`: continuations counted toward rowspan lookahead.
    pub fn continues_up(&self) -> bool {
        matches!(self, Self::ContUp | Self::ContCross)
    }

    /// The text an origin token carries, empty string for continuations and `ecel`.
    pub fn text(&self) -> &str {
        match self {
            Self::Filled(t) | Self::ColHeader(t) | Self::RowHeader(t) => t,
            _ => "",
        }
    }

    /// Build an `<ecel>` placeholder used by lenient-mode row padding.
    pub fn empty_cell() -> Self {
        Self::Empty
    }
}

/// All seven tag names recognized as OTSL cell-token boundaries, in a fixed
/// order used to build the tokenizing regex alternation.
pub const CELL_TAG_NAMES: [&str; 7] = ["ched", "rhed", "fcel", "ecel", "lcel", "ucel", "xcel"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_round_trip_through_origin_tokens() {
        assert_eq!(OtslToken::Filled("x".into()).tag_name(), "fcel");
        assert_eq!(OtslToken::ColHeader("x".into()).tag_name(), "ched");
        assert_eq!(OtslToken::RowHeader("x".into()).tag_name(), "rhed");
        assert_eq!(OtslToken::Empty.tag_name(), "ecel");
    }

    #[test]
    fn continuation_classification() {
        assert!(OtslToken::ContLeft.is_continuation());
        assert!(OtslToken::ContUp.is_continuation());
        assert!(OtslToken::ContCross.is_continuation());
        assert!(!OtslToken::Empty.is_continuation());

        assert!(OtslToken::ContLeft.continues_left());
        assert!(OtslToken::ContCross.continues_left());
        assert!(!OtslToken::ContUp.continues_left());

        assert!(OtslToken::ContUp.continues_up());
        assert!(OtslToken::ContCross.continues_up());
        assert!(!OtslToken::ContLeft.continues_up());
    }
}
