//! Validated, immutable gateway settings.
//!
//! # Data Flow
//! ```text
//! GatewayOptions (raw serde types)
//!     → creator.rs
//!         → compile route patterns (invalid → logged, route dropped)
//!         → check 'to', header names, cookie attributes (invalid → logged, dropped)
//!     → GatewaySettings { system, routes: [Arc<RouteSettings>] }
//!     → provider.rs: ArcSwap snapshot, watch channel bumped on every swap
//! ```
//!
//! # Design Decisions
//! - A snapshot is never mutated; reload builds a new one
//! - Each route owns its expression evaluator and parse cache
//! - Expressions are stored as text and evaluated per request

pub mod creator;
pub mod gateway;
pub mod provider;
pub mod proxy;

pub use creator::create_settings;
pub use gateway::{GatewaySettings, RouteSettings, SystemSettings};
pub use provider::GatewaySettingsProvider;
pub use proxy::{
    ClientSettings, CookieSettings, DownstreamResponseHeadersSettings, DownstreamResponseSettings,
    HeaderOverride, HeaderOverrides, ProxySettings, SameSiteMode, UpstreamRequestHeadersSettings,
    UpstreamRequestSenderSettings, UpstreamRequestSettings,
};
