//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum Router and wire up tracing
//! - Bind the server to a listener, with connection addresses
//! - Resolve the route and run the proxy pipeline per request
//! - Apply configuration reloads while serving

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::config::GatewayOptions;
use crate::http::client::UpstreamClients;
use crate::http::context::{ConnectionInfo, ProxyContext};
use crate::http::error::ProxyError;
use crate::http::request::build_upstream_request;
use crate::http::response::build_downstream_response;
use crate::observability::metrics;
use crate::resilience::timeouts::send_with_timeout;
use crate::routing::RouteResolver;
use crate::settings::GatewaySettingsProvider;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RouteResolver>,
    pub clients: Arc<UpstreamClients>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    provider: Arc<GatewaySettingsProvider>,
}

impl GatewayServer {
    pub fn new(provider: Arc<GatewaySettingsProvider>) -> Self {
        let state = AppState {
            resolver: Arc::new(RouteResolver::new(Arc::clone(&provider))),
            clients: Arc::new(UpstreamClients::new()),
        };

        Self {
            router: Self::build_router(state),
            provider,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, e.g. for nesting under a path base.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` completes.
    ///
    /// Options received on `updates` replace the active settings.
    pub async fn run<F>(
        self,
        listener: TcpListener,
        updates: Option<mpsc::UnboundedReceiver<GatewayOptions>>,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.provider.current().routes.len(),
            "HTTP server starting"
        );

        if let Some(mut updates) = updates {
            let provider = Arc::clone(&self.provider);
            tokio::spawn(async move {
                while let Some(options) = updates.recv().await {
                    provider.reload(&options);
                }
            });
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<ConnectionInfo>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Resolves the route, forwards the request and streams the response back.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let Some(route) = state.resolver.resolve(&path) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(&method, 404, "none", start_time);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let route_name = route.settings.route().to_string();
    let Some(proxy) = route.settings.proxy().cloned() else {
        tracing::debug!(path = %path, route = %route_name, "Route has no proxy settings");
        metrics::record_request(&method, 404, &route_name, start_time);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let connection = request
        .extensions()
        .get::<ConnectInfo<ConnectionInfo>>()
        .map(|ConnectInfo(info)| *info)
        .unwrap_or_default();
    let original_path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string());

    let (parts, body) = request.into_parts();
    let context = ProxyContext::new(parts, connection, route, proxy, original_path.as_deref());

    tracing::debug!(
        method = %method,
        path = %path,
        route = %route_name,
        correlation_id = %context.correlation_id(),
        "Proxying request"
    );

    let response = match forward(&state, &context, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %path,
                route = %route_name,
                correlation_id = %context.correlation_id(),
                error = %e,
                "Proxy request failed"
            );
            metrics::record_upstream_error(&route_name, e.kind());
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &route_name, start_time);
    response
}

async fn forward(state: &AppState, context: &ProxyContext, body: Body) -> Result<Response, ProxyError> {
    let request = build_upstream_request(context, body)?;
    let sender = &context.proxy().upstream_request.sender;
    let client = state.clients.get(sender, request.version());

    let response = send_with_timeout(&client, request, sender.timeout).await?;
    tracing::debug!(
        route = %context.route().settings.route(),
        status = %response.status(),
        "Upstream responded"
    );

    Ok(build_downstream_response(context, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_options;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn server(json: &str) -> GatewayServer {
        let options = parse_options(json, false).unwrap();
        GatewayServer::new(Arc::new(GatewaySettingsProvider::from_options(&options)))
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404() {
        let server = server(r#"{ "routes": { "/api": { "proxy": { "to": "http://127.0.0.1:1" } } } }"#);
        let response = server
            .router()
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_without_proxy_is_404() {
        let server = server(r#"{ "routes": { "/static": {} } }"#);
        let response = server
            .router()
            .oneshot(Request::get("/static/file").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_target_is_500() {
        let server = server(r#"{ "routes": { "/api": { "proxy": { "to": "not a url" } } } }"#);
        let response = server
            .router()
            .oneshot(Request::get("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Failed to proxy the request");
    }
}
