//! Route pattern engine.
//!
//! # Data Flow
//! ```text
//! Route pattern (config key, e.g. "/category/:category(/product/:product)")
//!     → compiler.rs (parse → validate → regex, cached by source string)
//!     → CompiledPattern
//!
//! Incoming path
//!     → normalizer.rs ("/category/bike/")
//!     → matcher.rs (captured variables + unmatched path suffix)
//! ```
//!
//! # Pattern Syntax
//! - `/` starts a segment
//! - `:name` captures one segment into a variable
//! - `*` matches one segment without capturing it
//! - `( ... )` makes its content optional
//! - `\` escapes one of `\ / : * ( )`
//!
//! # Design Decisions
//! - The syntax tree is a closed enum; each pass is an exhaustive match
//! - Matching is case-insensitive and anchored at the start of the path
//! - The `regex` crate matches in linear time, so no backtracking guard is
//!   needed; oversized input is rejected instead

pub mod ast;
pub mod compiler;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod parser;
pub mod validator;

pub use compiler::{compile, CompiledPattern};
pub use error::{PatternError, PatternErrors};
pub use matcher::{match_path, PathVariables, PatternMatchResult};
pub use normalizer::normalize;
