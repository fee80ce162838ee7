use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use profilehub::{app::build_app, auth::jwt::JwtKeys, config::AppConfig, state::AppState};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    build_app(AppState::fake())
}

async fn json_body(res: Response<Body>) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn location(res: &Response<Body>) -> String {
    res.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn valid_token() -> String {
    JwtKeys::new(&AppConfig::for_tests().jwt)
        .issue(Uuid::new_v4(), "j@x.com", "janedoe42")
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let res = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn protected_routes_require_session_cookie() {
    for (method, uri) in [
        (Method::GET, "/api/users/me"),
        (Method::GET, "/auth/me"),
        (Method::PUT, "/api/users/me/toggle-public"),
        (Method::DELETE, "/api/users/me"),
        (Method::GET, "/api/users/me/stats"),
        (Method::GET, "/api/activity"),
    ] {
        let res = app()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(json_body(res).await["error"], "unauthorized");
    }
}

#[tokio::test]
async fn garbage_session_cookie_is_rejected() {
    let res = app()
        .oneshot(
            Request::get("/api/users/me")
                .header(header::COOKIE, "token=not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"], "invalid or expired token");
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let res = app()
        .oneshot(Request::post("/auth/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookies = set_cookies(&res);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("token=;") && c.contains("Max-Age=0") && c.contains("Path=/")));
    assert_eq!(json_body(res).await["message"], "logged out");
}

#[tokio::test]
async fn login_redirects_with_state_cookie() {
    let res = app()
        .oneshot(Request::get("/auth/google").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);

    let loc = location(&res);
    let state = loc.split("state=").nth(1).unwrap().to_string();
    assert_eq!(state.len(), 32);

    let cookies = set_cookies(&res);
    let state_cookie = cookies
        .iter()
        .find(|c| c.starts_with("oauth_state="))
        .expect("state cookie");
    assert!(state_cookie.starts_with(&format!("oauth_state={};", state)));
    assert!(state_cookie.contains("HttpOnly"));
    assert!(state_cookie.contains("SameSite=Lax"));
}

async fn callback(query: &str, state_cookie: Option<&str>) -> Response<Body> {
    let mut req = Request::get(format!("/auth/google/callback{}", query));
    if let Some(s) = state_cookie {
        req = req.header(header::COOKIE, format!("oauth_state={}", s));
    }
    app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

#[tokio::test]
async fn callback_without_code_redirects_with_no_code() {
    let res = callback("", Some("abc")).await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "http://localhost:5173?error=no_code");

    let res = callback("?error=access_denied&state=abc", Some("abc")).await;
    assert_eq!(location(&res), "http://localhost:5173?error=no_code");
}

#[tokio::test]
async fn callback_with_mismatched_state_is_refused() {
    let res = callback("?code=abc&state=other", Some("expected")).await;
    assert_eq!(location(&res), "http://localhost:5173?error=invalid_state");

    let res = callback("?code=abc&state=expected", None).await;
    assert_eq!(location(&res), "http://localhost:5173?error=invalid_state");
}

#[tokio::test]
async fn callback_exchange_failure_redirects_and_clears_state() {
    let res = callback("?code=bad&state=s1", Some("s1")).await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "http://localhost:5173?error=exchange_failed");

    let cookies = set_cookies(&res);
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
    assert!(!cookies.iter().any(|c| c.starts_with("token=")));
}

#[tokio::test]
async fn unreadable_callback_query_redirects_with_no_code() {
    let res = callback("?code=a&code=b&state=s", Some("s")).await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "http://localhost:5173?error=no_code");

    let cookies = set_cookies(&res);
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
    assert!(!cookies.iter().any(|c| c.starts_with("token=")));
}

#[tokio::test]
async fn profile_fetch_failures_redirect_with_their_codes() {
    for (code, expected) in [("no-userinfo", "userinfo_failed"), ("garbled", "parse_failed")] {
        let res = callback(&format!("?code={}&state=s1", code), Some("s1")).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), format!("http://localhost:5173?error={}", expected));
        assert!(!set_cookies(&res).iter().any(|c| c.starts_with("token=")));
    }
}

#[tokio::test]
async fn username_length_is_validated_before_storage() {
    let res = app()
        .oneshot(
            Request::put("/api/users/me/username")
                .header(header::COOKIE, format!("token={}", valid_token()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"ab"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "username must be 3-50 characters");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let res = app()
        .oneshot(
            Request::put("/api/users/me")
                .header(header::COOKIE, format!("token={}", valid_token()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid request body");
}

#[tokio::test]
async fn cors_allows_configured_frontend_with_credentials() {
    let res = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/users/me")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let headers = res.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
