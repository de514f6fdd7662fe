use thiserror::Error;

/// Malformed id range text. Positions are character offsets into the input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeSyntaxError {
    #[error("expected '[' or '(' at position {position}")]
    ExpectedOpen { position: usize },

    #[error("expected ']' or ')' at position {position}")]
    ExpectedClose { position: usize },

    #[error("unexpected character {found:?} at position {position}")]
    Unexpected { position: usize, found: char },

    #[error("invalid id {text:?} at position {position}")]
    InvalidId { position: usize, text: String },
}

impl RangeSyntaxError {
    /// Character offset of the offending input.
    pub fn position(&self) -> usize {
        match self {
            Self::ExpectedOpen { position }
            | Self::ExpectedClose { position }
            | Self::Unexpected { position, .. }
            | Self::InvalidId { position, .. } => *position,
        }
    }
}
