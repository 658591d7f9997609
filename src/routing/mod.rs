//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs normalize ("api/x" → "/api/x/")
//!     → for each route in configuration order:
//!           pattern::match_path(route pattern, normalized path)
//!     → Return: Route { settings, variables, path_suffix } or None
//! ```
//!
//! # Design Decisions
//! - Routes are compiled when settings are created, never per request
//! - Deterministic: same path and snapshot always match the same route
//! - First match wins (configuration order)

pub mod route;
pub mod router;

pub use route::Route;
pub use router::{resolve_in, RouteResolver};
