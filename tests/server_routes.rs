//! Sync server routes, exercised in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use countersync::config::CsrfConfig;
use countersync::server::{build_router, ServerState};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn state() -> ServerState {
    ServerState::new(CsrfConfig::default())
}

async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

fn sync_request(body: &str, cookie: Option<&str>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/counter/sync")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(token) = token {
        builder = builder.header("X-CSRF-Token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let resp = build_router(state())
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_counter_page_issues_csrf_cookie() {
    let resp = build_router(state())
        .oneshot(Request::get("/counter").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing csrf cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("_gforge_csrf="));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let body = body_string(resp).await;
    assert!(body.contains(r#"id="server-count-value""#));
}

#[tokio::test]
async fn test_counter_page_keeps_existing_cookie() {
    let req = Request::get("/counter")
        .header(header::COOKIE, "_gforge_csrf=already")
        .body(Body::empty())
        .unwrap();
    let resp = build_router(state()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_counter_page_replaces_empty_cookie() {
    let req = Request::get("/counter")
        .header(header::COOKIE, "_gforge_csrf=")
        .body(Body::empty())
        .unwrap();
    let resp = build_router(state()).oneshot(req).await.unwrap();

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("empty cookie should be reissued")
        .to_str()
        .unwrap();
    assert!(set_cookie.len() > "_gforge_csrf=".len());
}

#[tokio::test]
async fn test_head_requests_are_counted() {
    let state = state();
    let resp = build_router(state.clone())
        .oneshot(
            Request::head("/counter/widget")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.prefetches(), 1);

    build_router(state.clone())
        .oneshot(Request::get("/counter/widget").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(state.prefetches(), 1);
}

#[tokio::test]
async fn test_sync_echoes_count() {
    let state = state();
    let req = sync_request("count=7", Some("_gforge_csrf=tok"), Some("tok"));
    let resp = build_router(state.clone()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "7");
    assert_eq!(state.last_count(), 7);

    let widget = build_router(state)
        .oneshot(Request::get("/counter/widget").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        body_string(widget).await,
        r#"<span id="server-count-value">7</span>"#
    );
}

#[tokio::test]
async fn test_sync_requires_csrf_header() {
    let state = state();
    let resp = build_router(state.clone())
        .oneshot(sync_request("count=3", Some("_gforge_csrf=tok"), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_string(resp).await.contains("csrf_mismatch"));
    assert_eq!(state.last_count(), 0);
}

#[tokio::test]
async fn test_sync_rejects_mismatched_token() {
    let resp = build_router(state())
        .oneshot(sync_request("count=3", Some("_gforge_csrf=tok"), Some("other")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = build_router(state())
        .oneshot(sync_request("count=3", None, Some("tok")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sync_rejects_invalid_count() {
    for body in ["count=-1", "count=abc", "other=1", "count="] {
        let resp = build_router(state())
            .oneshot(sync_request(body, Some("_gforge_csrf=tok"), Some("tok")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {}", body);
        assert!(body_string(resp).await.contains("invalid_count"));
    }
}
