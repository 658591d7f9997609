//! Route pattern parser.
//!
//! # Grammar
//! ```text
//! pattern  := item*
//! item     := '/' | '*' | ':' name | '(' pattern ')' | '\' escaped | literal
//! name     := [A-Za-z_][A-Za-z0-9_]*
//! escaped  := '\' | '/' | ':' | '*' | '(' | ')'
//! ```
//!
//! A backslash followed by anything outside the escapable set is a literal
//! backslash.

use crate::expression::trie::is_valid_char;
use crate::pattern::ast::PatternNode;
use crate::pattern::error::PatternError;

const ESCAPABLE: &[char] = &['\\', '/', ':', '*', '(', ')'];

/// Strip surrounding whitespace plus a single leading and trailing `/`.
pub(crate) fn trim_pattern(pattern: &str) -> &str {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);

    // An escaped trailing slash is content, not a separator
    match trimmed.strip_suffix('/') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => trimmed,
    }
}

/// Parse a route pattern into its syntax tree.
pub fn parse(pattern: &str) -> Result<PatternNode, PatternError> {
    let chars: Vec<char> = trim_pattern(pattern).chars().collect();
    let mut parser = Parser { chars, pos: 0 };
    let node = parser.parse_sequence(0)?;

    // parse_sequence only stops early on ')'
    if let Some(&token) = parser.peek() {
        return Err(PatternError::UnexpectedToken {
            token,
            position: parser.pos,
        });
    }

    Ok(node)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&char> {
        self.chars.get(self.pos)
    }

    fn parse_sequence(&mut self, depth: usize) -> Result<PatternNode, PatternError> {
        let mut node = PatternNode::empty();
        let mut literal = String::new();

        while let Some(&c) = self.peek() {
            match c {
                '/' => {
                    node = flush(node, &mut literal).concat(PatternNode::SegmentStart);
                    self.pos += 1;
                }
                '*' => {
                    node = flush(node, &mut literal).concat(PatternNode::Wildcard);
                    self.pos += 1;
                }
                ':' => {
                    node = flush(node, &mut literal);
                    let variable = self.parse_variable()?;
                    node = node.concat(variable);
                }
                '(' => {
                    node = flush(node, &mut literal);
                    let open = self.pos;
                    self.pos += 1;
                    let inner = self.parse_sequence(depth + 1)?;
                    if self.peek() != Some(&')') {
                        return Err(PatternError::MissingClosingParenthesis { position: open });
                    }
                    self.pos += 1;
                    if !inner.is_empty() {
                        node = node.concat(PatternNode::Optional(Box::new(inner)));
                    }
                }
                ')' => {
                    if depth == 0 {
                        return Err(PatternError::UnexpectedToken {
                            token: c,
                            position: self.pos,
                        });
                    }
                    break;
                }
                '\\' => match self.chars.get(self.pos + 1) {
                    Some(next) if ESCAPABLE.contains(next) => {
                        literal.push(*next);
                        self.pos += 2;
                    }
                    _ => {
                        literal.push('\\');
                        self.pos += 1;
                    }
                },
                other => {
                    literal.push(other);
                    self.pos += 1;
                }
            }
        }

        Ok(flush(node, &mut literal))
    }

    fn parse_variable(&mut self) -> Result<PatternNode, PatternError> {
        // skip ':'
        self.pos += 1;
        let start = self.pos;

        while let Some(&c) = self.peek() {
            if !is_valid_char(c) {
                break;
            }
            self.pos += 1;
        }

        let name: String = self.chars[start..self.pos].iter().collect();
        match name.chars().next() {
            None => Err(PatternError::MissingVariableName { position: start }),
            Some(first) if first.is_ascii_digit() => Err(PatternError::VariableNameStartsWithDigit {
                name,
                position: start,
            }),
            Some(_) => Ok(PatternNode::Variable(name)),
        }
    }
}

fn flush(node: PatternNode, literal: &mut String) -> PatternNode {
    if literal.is_empty() {
        node
    } else {
        node.concat(PatternNode::Match(std::mem::take(literal)))
    }
}
