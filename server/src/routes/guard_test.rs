use crate::routes::app;
use crate::state::test_helpers::test_app_state;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

fn page(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn dashboard_without_refresh_cookie_redirects_to_login() {
    let response = app(test_app_state()).oneshot(page("/dashboard", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn nested_protected_path_keeps_full_path_in_redirect() {
    let response = app(test_app_state()).oneshot(page("/orders/42", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login?redirect=%2Forders%2F42");
}

#[tokio::test]
async fn empty_refresh_cookie_counts_as_absent() {
    let response = app(test_app_state())
        .oneshot(page("/checkout", Some("refreshToken=")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn protected_page_with_refresh_cookie_renders() {
    let response = app(test_app_state())
        .oneshot(page("/profile", Some("refreshToken=anything")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Profile"));
}

#[tokio::test]
async fn login_page_never_redirects() {
    let response = app(test_app_state()).oneshot(page("/auth/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_pages_ignore_cookies() {
    for uri in ["/", "/search", "/cart"] {
        let without = app(test_app_state()).oneshot(page(uri, None)).await.unwrap();
        let with = app(test_app_state())
            .oneshot(page(uri, Some("refreshToken=x")))
            .await
            .unwrap();
        assert_eq!(without.status(), StatusCode::OK, "{uri}");
        assert_eq!(with.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn api_paths_are_not_guarded() {
    let response = app(test_app_state()).oneshot(page("/api/auth/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let response = app(test_app_state()).oneshot(page("/nowhere", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
