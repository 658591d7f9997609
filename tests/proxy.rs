//! End-to-end proxy tests: reqwest → gateway → mock backend.

mod common;

use std::time::Duration;

use common::{closed_address, ok_response, start_gateway, start_mock_backend, start_silent_backend};
use gateway_core::config::loader::parse_options;

#[tokio::test]
async fn test_proxies_route_variables_suffix_and_query() {
    let (backend, recorded) = start_mock_backend(ok_response("hello", &[])).await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/api/:version": {{ "proxy": {{ "to": "http://{backend}/$version" }} }} }} }}"#
    ))
    .await;

    let client = reqwest::Client::new();
    let response = client
        .get(gateway.url("/api/v1/users?page=2"))
        .header("X_Bad_Header", "1")
        .header("x-custom", "kept")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["via"], "1.1 gwcore");
    assert_eq!(response.text().await.unwrap(), "hello");

    let requests = recorded.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method(), "GET");
    assert_eq!(request.target(), "/v1/users?page=2");
    assert_eq!(request.header("x-custom"), Some("kept"));
    assert_eq!(request.header("x_bad_header"), None);
    assert_eq!(request.header("x-forwarded-for"), Some("127.0.0.1"));
    assert_eq!(request.header("x-forwarded-proto"), Some("http"));
    assert_eq!(request.header("x-correlation-id").map(str::len), Some(32));
    assert_eq!(request.header("x-call-id").map(str::len), Some(32));
}

#[tokio::test]
async fn test_request_body_is_forwarded() {
    let (backend, recorded) = start_mock_backend(ok_response("", &[])).await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/upload": {{ "proxy": {{ "to": "http://{backend}/store" }} }} }} }}"#
    ))
    .await;

    let response = reqwest::Client::new()
        .post(gateway.url("/upload"))
        .header("content-type", "application/json")
        .body(r#"{"name":"bike"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let requests = recorded.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.method(), "POST");
    assert_eq!(request.target(), "/store");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.body, br#"{"name":"bike"}"#);
}

#[tokio::test]
async fn test_set_cookie_domain_removed() {
    let (backend, _) = start_mock_backend(ok_response(
        "",
        &["Set-Cookie: sessionId=1234; Domain=old.com", "X-Internal: secret"],
    ))
    .await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/app": {{ "proxy": {{
            "to": "http://{backend}",
            "downstreamResponse": {{ "headers": {{
                "cookies": {{ "sessionId": {{ "domain": "" }} }},
                "discards": ["x-internal"],
                "addServer": true
            }} }}
        }} }} }} }}"#
    ))
    .await;

    let response = reqwest::Client::new().get(gateway.url("/app")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["set-cookie"], "sessionId=1234");
    assert!(response.headers().get("x-internal").is_none());
    assert_eq!(response.headers()["server"], "gwcore");
}

#[tokio::test]
async fn test_second_route_matches() {
    let (first, first_recorded) = start_mock_backend(ok_response("first", &[])).await;
    let (second, second_recorded) = start_mock_backend(ok_response("second", &[])).await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{
            "/orders/:id": {{ "proxy": {{ "to": "http://{first}" }} }},
            "/products/:id": {{ "proxy": {{ "to": "http://{second}/items/$id" }} }}
        }} }}"#
    ))
    .await;

    let response = reqwest::Client::new()
        .get(gateway.url("/products/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "second");
    assert!(first_recorded.lock().unwrap().is_empty());
    assert_eq!(second_recorded.lock().unwrap()[0].target(), "/items/42");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let gateway = start_gateway(r#"{ "routes": { "/api": { "proxy": { "to": "http://127.0.0.1:1" } } } }"#).await;

    let response = reqwest::Client::new().get(gateway.url("/nowhere")).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unreachable_upstream_is_502() {
    let backend = closed_address().await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/api": {{ "proxy": {{ "to": "http://{backend}" }} }} }} }}"#
    ))
    .await;

    let response = reqwest::Client::new().get(gateway.url("/api")).send().await.unwrap();
    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn test_slow_upstream_is_504() {
    let backend = start_silent_backend().await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/api": {{ "proxy": {{
            "to": "http://{backend}",
            "upstreamRequest": {{ "sender": {{ "timeoutInMilliseconds": 200 }} }}
        }} }} }} }}"#
    ))
    .await;

    let response = reqwest::Client::new().get(gateway.url("/api")).send().await.unwrap();
    assert_eq!(response.status(), 504);
}

#[tokio::test]
async fn test_hot_reload_switches_upstream() {
    let (old, _) = start_mock_backend(ok_response("old", &[])).await;
    let (new, _) = start_mock_backend(ok_response("new", &[])).await;
    let gateway = start_gateway(&format!(
        r#"{{ "routes": {{ "/svc": {{ "proxy": {{ "to": "http://{old}" }} }} }} }}"#
    ))
    .await;

    let client = reqwest::Client::new();
    let body = client.get(gateway.url("/svc")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "old");

    let reloaded = parse_options(
        &format!(r#"{{ "routes": {{ "/svc": {{ "proxy": {{ "to": "http://{new}" }} }} }} }}"#),
        false,
    )
    .unwrap();
    gateway.updates.send(reloaded).unwrap();

    let mut body = String::new();
    for _ in 0..50 {
        body = client.get(gateway.url("/svc")).send().await.unwrap().text().await.unwrap();
        if body == "new" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body, "new");
}
