//! Liveness collaborators: active health monitor and admin toggle.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use rr_proxy::Backend;

mod common;

#[tokio::test]
async fn test_health_check_eviction_and_recovery() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;

    let mut config = common::proxy_config(&[b1.url(), b2.url()]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    config.health_check.unhealthy_threshold = 1;
    config.health_check.healthy_threshold = 1;
    let proxy = common::start_proxy(config).await;
    let client = common::client();

    b2.set_healthy(false);
    let evicted = common::eventually(Duration::from_secs(5), || {
        !proxy.pool.backends()[1].is_alive()
    })
    .await;
    assert!(evicted, "b2 should be marked dead");
    assert!(proxy.pool.backends()[0].is_alive());

    for _ in 0..6 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "b1", "only b1 should serve after eviction");
    }

    b2.set_healthy(true);
    let recovered = common::eventually(Duration::from_secs(5), || {
        proxy.pool.backends()[1].is_alive()
    })
    .await;
    assert!(recovered, "b2 should be marked alive again");

    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        bodies.push(res.text().await.unwrap());
    }
    assert!(bodies.iter().any(|b| b == "b2"), "b2 should serve again: {:?}", bodies);
}

#[tokio::test]
async fn test_health_check_targets_backend_path_and_query() {
    let b1 = common::start_mock_backend("b1").await;

    let mut config = common::proxy_config(&[format!("{}/app?token=1", b1.url())]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.path = "/health".into();
    let _proxy = common::start_proxy(config).await;

    assert!(common::eventually(Duration::from_secs(5), || b1.hits() > 0).await);
    let head = b1.last_request().expect("health check reached the backend");
    assert!(
        head.starts_with("get /app/health?token=1 http/1.1\r\n"),
        "head: {}",
        head
    );
}

#[tokio::test]
async fn test_admin_toggles_liveness() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;
    let admin_addr = common::unused_addr().await;

    let mut config = common::proxy_config(&[b1.url(), b2.url()]);
    config.admin.enabled = true;
    config.admin.bind_address = admin_addr.to_string();
    config.admin.api_key = "test-key".into();
    let proxy = common::start_proxy(config).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = common::client();
    let admin = format!("http://{}", admin_addr);

    let res = client
        .put(format!("{}/admin/backends/0/liveness", admin))
        .json(&json!({ "alive": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(format!("{}/admin/backends/0/liveness", admin))
        .bearer_auth("test-key")
        .json(&json!({ "alive": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["alive"], false);

    for _ in 0..3 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "b2");
    }
    assert_eq!(b1.hits(), 0);

    let status: Value = client
        .get(format!("{}/admin/status", admin))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "degraded");
    assert_eq!(status["live_backends"], 1);
}
