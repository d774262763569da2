mod common;

use axum::http::{Method, StatusCode, header};
use axum::body::Body;
use axum::http::Request;
use common::{FakeBackend, app, call, config, unreachable_url};
use serde_json::json;
use signatom_relay::{KeyMaterial, paths};
use tower::ServiceExt;

#[tokio::test]
async fn healthcheck_returns_200() {
    let (app, _) = app(config(&unreachable_url()));

    let (status, body) = call(&app, Method::GET, paths::HEALTHCHECK).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Ok");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (app, _) = app(config(&unreachable_url()));

    let (status, _) = call(&app, Method::GET, "/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutating_steps_reject_get() {
    let backend = FakeBackend::start().await;
    let (app, _) = app(config(&backend.url));

    for path in [paths::GENERATE_KEY, paths::SIGN_WITH_KEY, paths::SIGN_WITHOUT_KEY] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{path}");
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn verify_steps_reject_post() {
    let backend = FakeBackend::start().await;
    let (app, _) = app(config(&backend.url));

    for path in [paths::VERIFY_WITH_KEY, paths::VERIFY_WITHOUT_KEY] {
        let (status, body) = call(&app, Method::POST, path).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{path}");
        assert_eq!(body, "Only GET method is allowed");
    }

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn session_status_hides_private_key() {
    let (app, state) = app(config(&unreachable_url()));
    state.session.update(|session| {
        session.key = KeyMaterial {
            private_key: "secret-private".to_string(),
            public_key: "u1".to_string(),
            key_id: "k1".to_string(),
        }
    });

    let (status, body) = call(&app, Method::GET, paths::SESSION).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("secret-private"));
    let status: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        status,
        json!({
            "key_generated": true,
            "public_key": "u1",
            "key_id": "k1",
            "signed": false,
            "certificate_cached": false,
        })
    );
}
