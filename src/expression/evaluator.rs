//! Expression parsing, caching and evaluation.
//!
//! An expression is plain text with `$name` tokens. Parsing turns it into a
//! list of instructions once; every request then only walks that list.

use std::sync::Arc;

use crate::cache::CopyOnWriteCache;
use crate::expression::context::ExpressionContext;
use crate::expression::system::{system_variables, SystemVariable};
use crate::expression::trie::{is_valid_char, VariableTrie};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Literal(String),
    System(SystemVariable),
    /// A route variable, resolved against the current match at evaluation time.
    Route(String),
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedExpression {
    instructions: Vec<Instruction>,
}

impl ParsedExpression {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// True if the expression contains no variables at all.
    pub fn is_constant(&self) -> bool {
        self.instructions
            .iter()
            .all(|i| matches!(i, Instruction::Literal(_)))
    }

    pub fn evaluate<C: ExpressionContext + ?Sized>(&self, context: &C) -> String {
        match self.instructions.as_slice() {
            [] => String::new(),
            [Instruction::Literal(text)] => text.clone(),
            instructions => {
                let mut out = String::new();
                for instruction in instructions {
                    match instruction {
                        Instruction::Literal(text) => out.push_str(text),
                        Instruction::System(variable) => variable.write(context, &mut out),
                        Instruction::Route(name) => {
                            out.push_str(context.route_variable(name).unwrap_or_default())
                        }
                    }
                }
                out
            }
        }
    }
}

/// Parses and evaluates expressions for one set of route variables.
///
/// Each route owns one evaluator, so the cache is shared by every request on
/// that route and the same text can resolve differently on routes that
/// declare different variables.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    route_variables: VariableTrie<()>,
    cache: CopyOnWriteCache<String, Arc<ParsedExpression>>,
}

impl ExpressionEvaluator {
    /// An evaluator that only knows system variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// An evaluator for a route declaring the given variables.
    pub fn with_route_variables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut route_variables = VariableTrie::new();
        for name in names {
            route_variables.add(name.as_ref(), ());
        }
        Self {
            route_variables,
            cache: CopyOnWriteCache::new(),
        }
    }

    /// Evaluate `expression` against the request.
    pub fn evaluate<C: ExpressionContext + ?Sized>(&self, context: &C, expression: &str) -> String {
        // Fast path: nothing to substitute
        if !expression.contains('$') {
            return expression.to_string();
        }
        self.parse(expression).evaluate(context)
    }

    /// The cached parse of `expression`.
    pub fn parse(&self, expression: &str) -> Arc<ParsedExpression> {
        self.cache.get_or_insert_with(expression, || {
            let parsed = Arc::new(self.parse_uncached(expression));
            tracing::trace!(
                expression = %expression,
                instructions = parsed.instructions().len(),
                "Expression parsed"
            );
            parsed
        })
    }

    /// Number of distinct expressions parsed so far.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn parse_uncached(&self, expression: &str) -> ParsedExpression {
        let mut instructions = Vec::new();
        let mut literal = String::new();
        let mut rest = expression;

        while let Some(dollar) = rest.find('$') {
            literal.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            let name_len = after
                .find(|c: char| !is_valid_char(c))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            match self.lookup(name) {
                Some((instruction, length)) => {
                    if !literal.is_empty() {
                        instructions.push(Instruction::Literal(std::mem::take(&mut literal)));
                    }
                    instructions.push(instruction);
                    rest = &after[length..];
                }
                None => {
                    // Unknown token: keep the '$' and let the name flow as text
                    literal.push('$');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            instructions.push(Instruction::Literal(literal));
        }

        ParsedExpression { instructions }
    }

    /// Longest match between system and route variables; ties go to the
    /// system variable.
    fn lookup(&self, name: &str) -> Option<(Instruction, usize)> {
        let system = system_variables().get_best_match(name);
        let route = self.route_variables.get_best_match(name);

        match (system, route) {
            (Some((variable, s)), Some((_, r))) if s >= r => Some((Instruction::System(*variable), s)),
            (_, Some((_, r))) => Some((Instruction::Route(name[..r].to_string()), r)),
            (Some((variable, s)), None) => Some((Instruction::System(*variable), s)),
            (None, None) => None,
        }
    }
}
