//! Pattern compilation errors.

use thiserror::Error;

/// A single problem found while parsing or validating a route pattern.
///
/// Positions are zero-based character offsets into the pattern after the
/// surrounding whitespace and the single leading `/` have been stripped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("a variable name is expected at position {position}")]
    MissingVariableName { position: usize },

    #[error("variable name '{name}' at position {position} must not start with a digit")]
    VariableNameStartsWithDigit { name: String, position: usize },

    #[error("the optional group opened at position {position} is missing its closing ')'")]
    MissingClosingParenthesis { position: usize },

    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken { token: char, position: usize },

    #[error("two consecutive '/' are not allowed")]
    ConsecutiveSegmentSeparators,

    #[error("two consecutive '*' wildcards are not allowed")]
    ConsecutiveWildcards,

    #[error("variables '{first}' and '{second}' share a segment; only one variable per segment is allowed")]
    MultipleVariablesInSegment { first: String, second: String },

    #[error("variable '{name}' is declared more than once")]
    DuplicateVariable { name: String },

    #[error("failed to build the regular expression: {0}")]
    Regex(String),
}

/// All errors reported for one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternErrors(pub Vec<PatternError>);

impl PatternErrors {
    pub fn iter(&self) -> impl Iterator<Item = &PatternError> {
        self.0.iter()
    }
}

impl From<PatternError> for PatternErrors {
    fn from(error: PatternError) -> Self {
        Self(vec![error])
    }
}

impl std::fmt::Display for PatternErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for PatternErrors {}
