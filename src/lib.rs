//! Gateway core: a configurable reverse proxy library.
//!
//! Routes are URL path patterns (`/product/:id(/details)`) mapped to upstream
//! URL expressions (`http://catalog/$id$request_query_string`), with
//! per-route header, cookie and client policies.

// Matching and expressions
pub mod cache;
pub mod expression;
pub mod pattern;

// Configuration
pub mod config;
pub mod settings;

// Request pipeline
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayOptions;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use settings::GatewaySettingsProvider;
