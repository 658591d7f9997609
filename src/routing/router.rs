//! Route lookup.
//!
//! # Responsibilities
//! - Normalize the request path once
//! - Try routes in configuration order, first match wins
//! - Remember recent results per settings snapshot
//!
//! # Design Decisions
//! - The cache belongs to one snapshot and is dropped when settings change
//! - At `routeCacheMaxCount` entries the cache is cleared and refilled; 0 disables it
//! - Only matches are cached, so stray 404 paths cannot crowd out real routes

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::pattern::{match_path, normalize};
use crate::routing::route::Route;
use crate::settings::{GatewaySettings, GatewaySettingsProvider};

/// First matching route in `settings`, without caching.
pub fn resolve_in(settings: &GatewaySettings, path: &str) -> Option<Route> {
    let normalized = normalize(path);
    resolve_normalized(settings, &normalized)
}

fn resolve_normalized(settings: &GatewaySettings, normalized: &str) -> Option<Route> {
    settings.routes.iter().find_map(|route| {
        match_path(route.pattern(), normalized).map(|matched| Route {
            settings: Arc::clone(route),
            variables: matched.variables,
            path_suffix: matched.path_suffix,
        })
    })
}

struct RouteCache {
    settings: Arc<GatewaySettings>,
    entries: DashMap<String, Route>,
}

impl RouteCache {
    fn new(settings: Arc<GatewaySettings>) -> Self {
        Self {
            settings,
            entries: DashMap::new(),
        }
    }
}

/// Resolves request paths against the provider's current settings.
pub struct RouteResolver {
    provider: Arc<GatewaySettingsProvider>,
    cache: ArcSwap<RouteCache>,
}

impl RouteResolver {
    pub fn new(provider: Arc<GatewaySettingsProvider>) -> Self {
        let cache = RouteCache::new(provider.current());
        Self {
            provider,
            cache: ArcSwap::from_pointee(cache),
        }
    }

    /// Resolve `path` (the request path without query).
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let cache = self.current_cache();
        let normalized = normalize(path);

        if let Some(hit) = cache.entries.get(&normalized) {
            return Some(hit.value().clone());
        }

        let route = resolve_normalized(&cache.settings, &normalized)?;

        let limit = cache.settings.system.route_cache_max_count;
        if limit > 0 {
            if cache.entries.len() >= limit {
                cache.entries.clear();
                tracing::debug!(limit = limit, "Route cache full, cleared");
            }
            cache.entries.insert(normalized, route.clone());
        }

        Some(route)
    }

    /// Number of cached paths for the current snapshot.
    pub fn cached_count(&self) -> usize {
        self.current_cache().entries.len()
    }

    fn current_cache(&self) -> Arc<RouteCache> {
        let settings = self.provider.current();
        let cache = self.cache.load_full();
        if Arc::ptr_eq(&cache.settings, &settings) {
            return cache;
        }

        let fresh = Arc::new(RouteCache::new(settings));
        self.cache.store(Arc::clone(&fresh));
        tracing::debug!("Route cache reset for new settings");
        fresh
    }
}
