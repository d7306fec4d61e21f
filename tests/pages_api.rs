mod common;

use axum::http::StatusCode;
use common::{test_app, TestRequest};

#[tokio::test]
async fn html_pages_are_served() {
    let app = test_app().await;
    for (path, marker) in [
        ("/", "Fruit Scanner"),
        ("/login", "Log in"),
        ("/signup", "Sign up"),
    ] {
        let res = TestRequest::get(path).send(&app).await;
        assert_eq!(res.status, StatusCode::OK, "{path}");
        assert!(
            res.headers["content-type"].to_str().unwrap().starts_with("text/html"),
            "{path}"
        );
        assert!(res.text().contains(marker), "{path}");
    }
}

#[tokio::test]
async fn static_assets_and_health() {
    let app = test_app().await;

    let js = TestRequest::get("/static/app.js").send(&app).await;
    assert_eq!(js.status, StatusCode::OK);
    assert!(js.text().contains("/api/login"));

    let missing = TestRequest::get("/static/nope.css").send(&app).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let health = TestRequest::get("/health").send(&app).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.text(), "ok");
}
