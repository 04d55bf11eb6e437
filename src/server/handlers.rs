use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{Html, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use uuid::Uuid;

use crate::server::error::ServerError;
use crate::server::ServerState;
use crate::sync::COUNT_FIELD;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Counts `HEAD` requests, which only link prefetches send.
pub async fn track_prefetch(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::HEAD {
        tracing::debug!(path = %request.uri().path(), "Prefetch request");
        state.record_prefetch();
    }
    next.run(request).await
}

fn widget(count: u64) -> String {
    format!(r#"<span id="server-count-value">{}</span>"#, count)
}

/// Non-empty value of the CSRF cookie, if the client sent one.
fn csrf_cookie<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

pub async fn counter_page(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    let page = format!(
        "<!doctype html>\n<html><head><title>Counter</title></head><body>\n\
         <h1>Counter</h1>\n<p>Server value: {}</p>\n</body></html>\n",
        widget(state.last_count())
    );

    let cookie_name = state.csrf().cookie_name.clone();
    if csrf_cookie(&jar, &cookie_name).is_some() {
        return (jar, Html(page));
    }

    let token = Uuid::new_v4().simple().to_string();
    let jar = jar.add(
        Cookie::build((cookie_name, token))
            .path("/")
            .same_site(SameSite::Lax),
    );
    (jar, Html(page))
}

pub async fn counter_widget(State(state): State<ServerState>) -> Html<String> {
    Html(widget(state.last_count()))
}

/// Accepts `count=<n>` and echoes the digits back for the client to swap in.
pub async fn counter_sync(
    State(state): State<ServerState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, ServerError> {
    let csrf = state.csrf();
    let expected = csrf_cookie(&jar, &csrf.cookie_name);
    let presented = headers
        .get(csrf.header_name.as_str())
        .and_then(|v| v.to_str().ok());

    match (expected, presented) {
        (Some(expected), Some(presented)) if expected == presented => {}
        _ => {
            tracing::warn!("Rejected counter sync: CSRF token mismatch");
            return Err(ServerError::CsrfMismatch);
        }
    }

    let raw = form.get(COUNT_FIELD).map(String::as_str).unwrap_or_default();
    let count: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ServerError::InvalidCount(raw.to_string()))?;

    state.store_count(count);
    tracing::debug!(count, "Counter synced");
    Ok(Html(count.to_string()))
}
