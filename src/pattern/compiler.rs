//! Pattern compilation and the process-wide compiled pattern cache.
//!
//! # Data Flow
//! ```text
//! "/product/:id"
//!     → parser.rs    (PatternNode tree)
//!     → validator.rs (structural rules)
//!     → build_regex  ((?i)\A/?product/(?P<id>[^/]+)(?:/|\z))
//!     → CompiledPattern (cached by source string, failures included)
//! ```

use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};

use crate::cache::CopyOnWriteCache;
use crate::pattern::ast::PatternNode;
use crate::pattern::error::{PatternError, PatternErrors};
use crate::pattern::{parser, validator};

/// Upper bound on the compiled program size of a single route pattern.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

pub type CompileResult = Result<Arc<CompiledPattern>, PatternErrors>;

static PATTERN_CACHE: LazyLock<CopyOnWriteCache<String, CompileResult>> =
    LazyLock::new(CopyOnWriteCache::new);

/// A route pattern compiled to a regular expression.
#[derive(Debug)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
    variables: Vec<String>,
}

impl CompiledPattern {
    /// The source pattern this was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Declared variable names, in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Compile a route pattern, reusing a cached result when one exists.
///
/// Failed compilations are cached too, so a bad pattern is reported once and
/// never recompiled.
pub fn compile(pattern: &str) -> CompileResult {
    PATTERN_CACHE.get_or_insert_with(pattern, || {
        let result = compile_uncached(pattern);
        if let Err(errors) = &result {
            tracing::debug!(pattern = %pattern, errors = %errors, "Pattern failed to compile");
        }
        result
    })
}

/// Compile a route pattern without consulting the cache.
pub fn compile_uncached(pattern: &str) -> CompileResult {
    let node = parser::parse(pattern)?;
    validator::validate(&node)?;

    let mut variables = Vec::new();
    let mut body = String::new();
    build_regex(&node, &mut body, &mut variables);

    // Anchored at the start; the match must end on a segment boundary
    let source = format!(r"\A/?{}(?:/|\z)", body);

    let regex = RegexBuilder::new(&source)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| PatternErrors::from(PatternError::Regex(e.to_string())))?;

    Ok(Arc::new(CompiledPattern {
        pattern: pattern.to_string(),
        regex,
        variables,
    }))
}

fn build_regex(node: &PatternNode, out: &mut String, variables: &mut Vec<String>) {
    match node {
        PatternNode::Match(text) => out.push_str(&regex::escape(text)),
        PatternNode::SegmentStart => out.push('/'),
        PatternNode::Wildcard => out.push_str("[^/]+"),
        PatternNode::Variable(name) => {
            out.push_str("(?P<");
            out.push_str(name);
            out.push_str(">[^/]+)");
            variables.push(name.clone());
        }
        PatternNode::Optional(inner) => {
            out.push_str("(?:");
            build_regex(inner, out, variables);
            out.push_str(")?");
        }
        PatternNode::Concat(left, right) => {
            build_regex(left, out, variables);
            build_regex(right, out, variables);
        }
    }
}
