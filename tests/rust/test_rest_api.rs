//! HTTP surface: routing, status codes and the error envelope

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use image_similarity::network::rest::REQUEST_TIMEOUT_HEADER;

use super::common::{get_json, post_json, post_raw, string_list, test_config, test_router, test_router_with, TEST_DIM};

fn build_body(user_id: Value) -> Value {
    json!({
        "user_id": user_id,
        "image_hashes": ["a", "b", "c"],
        "image_embeddings": [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
    })
}

fn assert_error(body: &Value, kind: &str) {
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["kind"], kind);
    assert!(body["error"]["message"].is_string());
    assert!(body["error"]["retryable"].is_boolean());
}

#[tokio::test]
async fn test_build_then_search() {
    let router = test_router(test_config(TEST_DIM));

    let (status, body) = post_json(&router, "/build", build_body(json!(1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "size": 3}));

    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "n": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(string_list(&body["result"]), vec!["b", "a", "c"]);

    let (_, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [10.0, 0.0], "n": 3, "threshold": 5.0}),
    )
    .await;
    assert_eq!(body, json!({"ok": true, "result": []}));
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let router = test_router(test_config(TEST_DIM));

    let (status, _) = post_json(&router, "/build/", build_body(json!("bob"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &router,
        "/search/",
        json!({"user_id": "bob", "image_embedding": [2.0, 0.0], "n": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(string_list(&body["result"]), vec!["c"]);

    let (status, body) = post_json(&router, "/drop/", json!({"user_id": "bob"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "removed": true}));

    let (status, _) = get_json(&router, "/health/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_tenant_is_404() {
    let router = test_router(test_config(TEST_DIM));
    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "n": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "unknown_tenant");
    assert_eq!(body["error"]["retryable"], false);
}

#[tokio::test]
async fn test_build_validation_errors() {
    let router = test_router(test_config(TEST_DIM));
    post_json(&router, "/build", build_body(json!(1))).await;

    let cases = [
        (
            json!({"user_id": 1, "image_hashes": ["a"], "image_embeddings": [[1.0, 0.0, 0.0]]}),
            "dimension_mismatch",
        ),
        (
            json!({"user_id": 1, "image_hashes": ["a", "a"], "image_embeddings": [[1.0, 0.0], [0.0, 1.0]]}),
            "duplicate_id",
        ),
        (
            json!({"user_id": 1, "image_hashes": ["a", "b"], "image_embeddings": [[1.0, 0.0]]}),
            "length_mismatch",
        ),
    ];
    for (request, kind) in cases {
        let (status, body) = post_json(&router, "/build", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{kind}");
        assert_error(&body, kind);
    }

    // The earlier store is still bound
    let (_, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "n": 3}),
    )
    .await;
    assert_eq!(string_list(&body["result"]), vec!["b", "a", "c"]);
}

#[tokio::test]
async fn test_capacity_exceeded_is_413() {
    let mut config = test_config(1);
    config.max_tenant_size = 2;
    let router = test_router(config);

    let (status, body) = post_json(
        &router,
        "/build",
        json!({"user_id": 1, "image_hashes": ["a", "b", "c"], "image_embeddings": [[0.0], [1.0], [2.0]]}),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_error(&body, "capacity_exceeded");
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_request() {
    let router = test_router(test_config(TEST_DIM));

    let (status, body) = post_raw(&router, "/build", "not json", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let bad = [
        json!({"image_hashes": [], "image_embeddings": []}),
        json!({"user_id": 1, "image_hashes": "a", "image_embeddings": []}),
        json!({"user_id": 1.5, "image_hashes": [], "image_embeddings": []}),
        json!({"user_id": true, "image_hashes": [], "image_embeddings": []}),
        json!({"user_id": null, "image_hashes": [], "image_embeddings": []}),
        json!({"user_id": "", "image_hashes": [], "image_embeddings": []}),
    ];
    for request in bad {
        let (status, body) = post_json(&router, "/build", request.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{request}");
        assert_error(&body, "bad_request");
    }

    // None of the rejected requests created a tenant or counted as activity
    let (_, health) = get_json(&router, "/health").await;
    assert_eq!(health["tenants"], 0);
    assert_eq!(health["last_request_ts"], Value::Null);
}

#[tokio::test]
async fn test_search_parameter_errors() {
    let router = test_router(test_config(TEST_DIM));
    post_json(&router, "/build", build_body(json!(1))).await;

    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "n": -2}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "threshold": -3.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "dimension_mismatch");

    let (status, body) = post_json(
        &router,
        "/search",
        json!({"user_id": 1, "image_embedding": [1.0, 0.0], "n": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "result": []}));
}

#[tokio::test]
async fn test_request_timeout_header() {
    let router = test_router(test_config(TEST_DIM));
    post_json(&router, "/build", build_body(json!(1))).await;
    let search = json!({"user_id": 1, "image_embedding": [1.0, 0.0]}).to_string();

    let (status, body) = post_raw(&router, "/search", search.clone(), &[(REQUEST_TIMEOUT_HEADER, "0")]).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_error(&body, "deadline_exceeded");
    assert_eq!(body["error"]["retryable"], true);

    let (status, body) = post_raw(&router, "/search", search.clone(), &[(REQUEST_TIMEOUT_HEADER, "later")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let (status, _) = post_raw(&router, "/search", search, &[(REQUEST_TIMEOUT_HEADER, "5000")]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_body_is_bad_request() {
    let router = test_router_with(test_config(TEST_DIM), Duration::from_secs(30), 64);
    let request = json!({
        "user_id": 1,
        "image_hashes": (0..20).map(|i| format!("image-{i}")).collect::<Vec<_>>(),
        "image_embeddings": (0..20).map(|_| vec![0.0, 0.0]).collect::<Vec<_>>(),
    });
    let (status, body) = post_json(&router, "/build", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");
}

#[tokio::test]
async fn test_drop_unknown_tenant_succeeds() {
    let router = test_router(test_config(TEST_DIM));
    let (status, body) = post_json(&router, "/drop", json!({"user_id": 77})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "removed": false}));
}

#[tokio::test]
async fn test_health_and_tenants() {
    let router = test_router(test_config(TEST_DIM));

    let (status, health) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["ok"], true);
    assert_eq!(health["tenants"], 0);
    assert_eq!(health["total_vectors"], 0);
    assert_eq!(health["embedding_dim"], TEST_DIM);
    assert_eq!(health["last_request_ts"], Value::Null);

    post_json(&router, "/build", build_body(json!("2"))).await;
    post_json(&router, "/build", build_body(json!(1))).await;
    post_json(&router, "/build", build_body(json!(2))).await;

    let (_, health) = get_json(&router, "/health").await;
    assert_eq!(health["tenants"], 2);
    assert_eq!(health["total_vectors"], 6);
    assert!(health["last_request_ts"].is_string());

    let (status, body) = get_json(&router, "/tenants").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let listed: Vec<(String, u64, u64)> = body["tenants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            assert!(t["created_at"].is_string());
            (
                t["user_id"].as_str().unwrap().to_string(),
                t["size"].as_u64().unwrap(),
                t["builds"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(listed, vec![("1".to_string(), 3, 1), ("2".to_string(), 3, 2)]);

    post_json(&router, "/drop", json!({"user_id": 1})).await;
    let (_, body) = get_json(&router, "/tenants").await;
    assert_eq!(body["tenants"].as_array().unwrap().len(), 1);
    assert_eq!(body["tenants"][0]["user_id"], "2");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let router = test_router(test_config(TEST_DIM));

    let (status, body) = get_json(&router, "/collections").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");

    let (status, body) = post_json(&router, "/nope/", json!({"user_id": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");
}

#[tokio::test]
async fn test_wrong_method_uses_envelope() {
    let router = test_router(test_config(TEST_DIM));

    for uri in ["/build", "/search/", "/drop"] {
        let (status, body) = get_json(&router, uri).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_error(&body, "method_not_allowed");
        assert_eq!(body["error"]["retryable"], false);
    }

    let (status, body) = post_json(&router, "/health", json!({})).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_error(&body, "method_not_allowed");

    // Neither counts as activity
    let (_, health) = get_json(&router, "/health").await;
    assert_eq!(health["last_request_ts"], Value::Null);
}
