//! Route pattern syntax tree.

/// A node of a parsed route pattern.
///
/// The tree only lives between parsing and regex generation; the compiled
/// form is what gets cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Literal text matched verbatim (case-insensitively).
    Match(String),
    /// `:name`, captures one path segment.
    Variable(String),
    /// `/`
    SegmentStart,
    /// `*`, one or more characters of a single segment.
    Wildcard,
    /// `( ... )`
    Optional(Box<PatternNode>),
    Concat(Box<PatternNode>, Box<PatternNode>),
}

impl PatternNode {
    /// The empty pattern.
    pub fn empty() -> Self {
        PatternNode::Match(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PatternNode::Match(text) if text.is_empty())
    }

    /// Concatenate two nodes, eliding empty operands and merging adjacent
    /// literals.
    pub fn concat(self, right: PatternNode) -> PatternNode {
        if self.is_empty() {
            return right;
        }
        if right.is_empty() {
            return self;
        }

        match (self, right) {
            (PatternNode::Match(mut left), PatternNode::Match(right)) => {
                left.push_str(&right);
                PatternNode::Match(left)
            }
            (left, right) => PatternNode::Concat(Box::new(left), Box::new(right)),
        }
    }

    /// Flatten the tree into its top-level sequence, left to right.
    ///
    /// Optional groups are returned as single items; their contents are not
    /// expanded.
    pub fn sequence(&self) -> Vec<&PatternNode> {
        let mut items = Vec::new();
        self.collect_sequence(&mut items);
        items
    }

    fn collect_sequence<'a>(&'a self, items: &mut Vec<&'a PatternNode>) {
        match self {
            PatternNode::Concat(left, right) => {
                left.collect_sequence(items);
                right.collect_sequence(items);
            }
            node if node.is_empty() => {}
            node => items.push(node),
        }
    }
}
