//! Helpers to drive the full router in-process, without binding a socket.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use fruitscan::{build_app, AppConfig, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "fruitscan-test-boundary";

pub fn test_config() -> AppConfig {
    test_config_with(&[])
}

/// Test defaults, with `overrides` taking precedence.
pub fn test_config_with(overrides: &[(&str, &str)]) -> AppConfig {
    AppConfig::from_lookup(|key| {
        if let Some((_, v)) = overrides.iter().find(|(k, _)| *k == key) {
            return Some(v.to_string());
        }
        let v = match key {
            "SECRET_KEY" => "integration-test-secret",
            "MOCK_DELAY_MS" => "0",
            "STATIC_DIR" => concat!(env!("CARGO_MANIFEST_DIR"), "/static"),
            "MAX_UPLOAD_MB" => "1",
            _ => return None,
        };
        Some(v.to_string())
    })
    .expect("test config")
}

pub async fn test_app() -> Router {
    app_with_config(test_config()).await
}

pub async fn app_with_config(config: AppConfig) -> Router {
    let state = AppState::in_memory(config).await.expect("in-memory state");
    build_app(state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `name=value` of the session cookie set by this response, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("session_id="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub struct TestRequest {
    builder: axum::http::request::Builder,
    body: Body,
}

impl TestRequest {
    pub fn get(uri: &str) -> Self {
        Self {
            builder: Request::builder().method(Method::GET).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn post(uri: &str) -> Self {
        Self {
            builder: Request::builder().method(Method::POST).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn options(uri: &str) -> Self {
        Self {
            builder: Request::builder().method(Method::OPTIONS).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {token}"))
    }

    pub fn cookie(self, cookie: &str) -> Self {
        self.header("cookie", cookie)
    }

    pub fn json(mut self, value: &Value) -> Self {
        self.builder = self.builder.header(header::CONTENT_TYPE, "application/json");
        self.body = Body::from(value.to_string());
        self
    }

    /// Raw body with an explicit content type, or none at all.
    pub fn raw(mut self, content_type: Option<&str>, body: &str) -> Self {
        if let Some(ct) = content_type {
            self.builder = self.builder.header(header::CONTENT_TYPE, ct);
        }
        self.body = Body::from(body.to_string());
        self
    }

    /// Multipart body with a single text field and no `file` part.
    pub fn form_field(mut self, name: &str, value: &str) -> Self {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
        );
        self.builder = self.builder.header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        self.body = Body::from(body);
        self
    }

    /// Single-part multipart body carrying one `file` field.
    pub fn image(mut self, filename: &str, content_type: Option<&str>, data: &[u8]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.builder = self.builder.header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        self.body = Body::from(body);
        self
    }

    pub async fn send(self, app: &Router) -> TestResponse {
        let request = self.builder.body(self.body).expect("build request");
        let response = app.clone().oneshot(request).await.expect("router call");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Signs up a user and returns (access token, session cookie).
pub async fn signup(app: &Router, name: &str, email: &str, password: &str) -> (String, String) {
    let res = TestRequest::post("/api/signup")
        .json(&serde_json::json!({"name": name, "email": email, "password": password}))
        .send(app)
        .await;
    assert_eq!(res.status, StatusCode::OK, "signup failed: {}", res.text());
    let token = res.json()["access_token"]
        .as_str()
        .expect("access_token")
        .to_string();
    let cookie = res.session_cookie().expect("session cookie");
    (token, cookie)
}
