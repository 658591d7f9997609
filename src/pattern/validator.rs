//! Structural validation of parsed patterns.
//!
//! # Rules
//! - No two consecutive `/` (the stripped leading `/` counts as one)
//! - No two consecutive `*` without other content between them
//! - At most one variable per segment
//! - Variable names are unique across the pattern

use std::collections::HashSet;

use crate::pattern::ast::PatternNode;
use crate::pattern::error::{PatternError, PatternErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Previous {
    Segment,
    Wildcard,
    Other,
}

struct Validator<'a> {
    previous: Previous,
    segment_variable: Option<&'a str>,
    names: HashSet<String>,
    errors: Vec<PatternError>,
}

/// Validate a parsed pattern, returning every rule violation found.
pub fn validate(node: &PatternNode) -> Result<(), PatternErrors> {
    let mut validator = Validator {
        previous: Previous::Segment,
        segment_variable: None,
        names: HashSet::new(),
        errors: Vec::new(),
    };

    validator.visit(node);

    // A trailing separator left after stripping means the source ended in "//"
    if validator.previous == Previous::Segment && !node.is_empty() {
        validator.push(PatternError::ConsecutiveSegmentSeparators);
    }

    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(PatternErrors(validator.errors))
    }
}

impl<'a> Validator<'a> {
    fn push(&mut self, error: PatternError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    fn visit(&mut self, node: &'a PatternNode) {
        match node {
            PatternNode::Concat(left, right) => {
                self.visit(left);
                self.visit(right);
            }
            PatternNode::SegmentStart => {
                if self.previous == Previous::Segment {
                    self.push(PatternError::ConsecutiveSegmentSeparators);
                }
                self.previous = Previous::Segment;
                self.segment_variable = None;
            }
            PatternNode::Wildcard => {
                if self.previous == Previous::Wildcard {
                    self.push(PatternError::ConsecutiveWildcards);
                }
                self.previous = Previous::Wildcard;
            }
            PatternNode::Variable(name) => {
                if let Some(first) = self.segment_variable {
                    self.push(PatternError::MultipleVariablesInSegment {
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
                if !self.names.insert(name.to_ascii_lowercase()) {
                    self.push(PatternError::DuplicateVariable { name: name.clone() });
                }
                self.segment_variable = Some(name.as_str());
                self.previous = Previous::Other;
            }
            PatternNode::Optional(inner) => self.visit(inner),
            PatternNode::Match(text) => {
                if !text.is_empty() {
                    self.previous = Previous::Other;
                }
            }
        }
    }
}
