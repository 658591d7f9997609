//! Pooled upstream HTTP clients.
//!
//! Clients are cached by `httpClientName`, so routes sharing a name share a
//! connection pool. Each entry holds an HTTP/1 client and an HTTP/2
//! (prior knowledge) client built from the same settings.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Version;
use dashmap::DashMap;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::settings::{ClientSettings, UpstreamRequestSenderSettings};

pub type UpstreamClient = Client<HttpConnector, Body>;

#[derive(Debug)]
struct ClientEntry {
    settings: ClientSettings,
    http1: UpstreamClient,
    http2: UpstreamClient,
}

impl ClientEntry {
    fn new(settings: &ClientSettings) -> Self {
        Self {
            settings: settings.clone(),
            http1: build_client(settings, false),
            http2: build_client(settings, true),
        }
    }
}

fn build_client(settings: &ClientSettings, http2_only: bool) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_nodelay(true);
    connector.set_connect_timeout(settings.connect_timeout);

    let mut builder = Client::builder(TokioExecutor::new());
    if let Some(idle) = settings.pool_idle_timeout {
        builder.pool_idle_timeout(idle);
    }
    if let Some(max) = settings.max_connections_per_server {
        builder.pool_max_idle_per_host(max);
    }
    builder.http2_only(http2_only);
    builder.build(connector)
}

/// Cache of upstream clients keyed by client name.
#[derive(Debug, Default)]
pub struct UpstreamClients {
    entries: DashMap<String, Arc<ClientEntry>>,
}

impl UpstreamClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client for `sender`, speaking `version`.
    ///
    /// An entry whose settings changed after a reload is rebuilt.
    pub fn get(&self, sender: &UpstreamRequestSenderSettings, version: Version) -> UpstreamClient {
        let entry = self.entry(sender);
        if version == Version::HTTP_2 {
            entry.http2.clone()
        } else {
            entry.http1.clone()
        }
    }

    fn entry(&self, sender: &UpstreamRequestSenderSettings) -> Arc<ClientEntry> {
        if let Some(entry) = self.entries.get(&sender.http_client_name) {
            if entry.settings == sender.client {
                return Arc::clone(entry.value());
            }
        }

        let entry = Arc::new(ClientEntry::new(&sender.client));
        tracing::debug!(
            client = %sender.http_client_name,
            settings = ?sender.client,
            "Upstream HTTP client created"
        );
        self.entries
            .insert(sender.http_client_name.clone(), Arc::clone(&entry));
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
