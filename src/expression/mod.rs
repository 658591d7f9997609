//! Expression language used by route configuration.
//!
//! # Data Flow
//! ```text
//! "http://backend$request_path_base/items/$id$request_query_string"
//!     → evaluator.rs parse (once, cached per route)
//!         → trie.rs longest-prefix lookup: system variables, then route variables
//!     → [Literal, System, Literal, Route, System]
//!     → evaluate against the request context (every request)
//! ```
//!
//! # Design Decisions
//! - No delimiters: `$hostfoo` is `$host` followed by `foo`
//! - Unknown `$name` tokens are kept verbatim, `$` included
//! - Parsing never fails; evaluation never allocates more than the output

pub mod context;
pub mod evaluator;
pub mod system;
pub mod trie;

pub use context::ExpressionContext;
pub use evaluator::{ExpressionEvaluator, Instruction, ParsedExpression};
pub use system::SystemVariable;
pub use trie::VariableTrie;
