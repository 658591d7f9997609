//! Holds the current settings snapshot and swaps it on reload.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::config::schema::GatewayOptions;
use crate::settings::creator::create_settings;
use crate::settings::gateway::GatewaySettings;

/// Shared access to the active settings.
///
/// Readers take an `Arc` snapshot once per request and keep using it even if
/// a reload lands meanwhile.
#[derive(Debug)]
pub struct GatewaySettingsProvider {
    current: ArcSwap<GatewaySettings>,
    version: watch::Sender<u64>,
}

impl GatewaySettingsProvider {
    pub fn new(settings: GatewaySettings) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            current: ArcSwap::from_pointee(settings),
            version,
        }
    }

    pub fn from_options(options: &GatewayOptions) -> Self {
        Self::new(create_settings(options))
    }

    /// The active snapshot.
    pub fn current(&self) -> Arc<GatewaySettings> {
        self.current.load_full()
    }

    /// Rebuild settings from freshly loaded options and publish them.
    pub fn reload(&self, options: &GatewayOptions) {
        self.replace(create_settings(options));
        tracing::info!(version = *self.version.borrow(), "Gateway settings reloaded");
    }

    pub fn replace(&self, settings: GatewaySettings) {
        self.current.store(Arc::new(settings));
        self.version.send_modify(|version| *version += 1);
    }

    /// Receives the new version number after every swap.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
