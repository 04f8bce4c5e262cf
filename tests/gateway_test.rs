//! End-to-end tests for the admission pipeline: bot, CSRF, and rate-limit
//! gates, header injection, and upstream forwarding.

mod common;

use axum::http::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn admitted_request_is_forwarded_with_security_headers() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::browser_client()
        .get(format!("http://{addr}/dashboard"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert!(res.headers().contains_key("content-security-policy"));
    assert!(!res.headers().contains_key("cross-origin-embedder-policy"));
    assert_eq!(res.text().await.unwrap(), "erp-ok");
}

#[tokio::test]
async fn missing_user_agent_is_rejected() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::bare_client()
        .get(format!("http://{addr}/dashboard"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn curl_user_agent_is_rejected_with_headers_attached() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let client = reqwest::Client::builder()
        .user_agent("curl/7.68.0")
        .no_proxy()
        .build()
        .unwrap();
    let res = client
        .get(format!("http://{addr}/dashboard"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    // Rejections carry the security header set too.
    assert_eq!(res.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn honeypot_probe_is_rejected() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::browser_client()
        .get(format!("http://{addr}/wp-admin/install.php"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn post_without_origin_is_rejected() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .body("message=hello")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request origin");
}

#[tokio::test]
async fn post_from_foreign_origin_is_rejected() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .header("origin", "https://evil.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn post_from_allowed_origin_is_forwarded() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .header("origin", "https://unicore.edu")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_tier_rate_limit_kicks_in_at_twenty_one() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let client = common::browser_client();
    for i in 1..=20 {
        let res = client
            .get(format!("http://{addr}/api/auth/session"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "request {i} should pass");
    }

    let res = client
        .get(format!("http://{addr}/api/auth/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = res.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn rate_limit_tiers_are_keyed_separately() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    let client = common::browser_client();
    // Exhaust the auth tier.
    for _ in 0..21 {
        client
            .get(format!("http://{addr}/api/auth/session"))
            .send()
            .await
            .unwrap();
    }

    // Page traffic from the same client still flows.
    let res = client
        .get(format!("http://{addr}/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn config_reload_takes_effect_without_restart() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let mut config = common::gateway_config(upstream, auth);
    let (addr, _shutdown, updates) = common::spawn_gateway_with_updates(config.clone()).await;

    // The portal origin is not allowed yet.
    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .header("origin", "https://portal.unicore.edu")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Push an updated config the way the file watcher would.
    config
        .security
        .allowed_origins
        .push("https://portal.unicore.edu".to_string());
    updates.send(config).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .header("origin", "https://portal.unicore.edu")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_rejection_carries_security_headers() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let mut config = common::gateway_config(upstream, auth);
    config.security.max_body_bytes = 1024;
    let (addr, _shutdown) = common::spawn_gateway(config).await;

    let res = common::browser_client()
        .post(format!("http://{addr}/contact"))
        .header("origin", "https://unicore.edu")
        .body(vec![b'x'; 4096])
        .send()
        .await
        .unwrap();

    assert!(
        res.status().is_client_error() || res.status().is_server_error(),
        "oversized body must not reach the upstream, got {}",
        res.status()
    );
    assert_eq!(res.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn health_probe_bypasses_the_gates() {
    let upstream = common::spawn_upstream().await;
    let auth = common::spawn_auth_backend().await;
    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(upstream, auth)).await;

    // No user-agent at all: the bot gate would reject anything else.
    let res = common::bare_client()
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    // Headers are still attached outside the gates.
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unreachable_upstream_maps_to_bad_gateway() {
    let auth = common::spawn_auth_backend().await;
    // Reserve a port and release it so nothing is listening there.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let (addr, _shutdown) = common::spawn_gateway(common::gateway_config(dead_addr, auth)).await;

    let res = common::browser_client()
        .get(format!("http://{addr}/dashboard"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Upstream request failed");
}
