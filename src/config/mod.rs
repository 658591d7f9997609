//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize)
//!     → GatewayOptions (raw, may contain invalid entries)
//!     → crate::settings (validate, drop bad entries, compile patterns)
//!     → Arc<GatewaySettings> swapped into the provider
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new options
//!     → sent to the server, which rebuilds settings and swaps them in
//! ```
//!
//! # Design Decisions
//! - Options are plain serde types; all checks happen in `settings`
//! - All fields have defaults to allow minimal configs
//! - Route order is document order and is significant

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_options, ConfigError};
pub use schema::{
    CookieOptions, DownstreamResponseHeadersOptions, DownstreamResponseOptions, GatewayOptions,
    HeaderValuesOptions, ProxyOptions, RouteOptions, ServerOptions, SystemOptions,
    UpstreamRequestHeadersOptions, UpstreamRequestOptions, UpstreamRequestSenderOptions,
};
