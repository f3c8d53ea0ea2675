#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, header},
};
use postboard::{
    ServerConfig, auth::IpSource, create_app, db::Database, jwt::JwtConfig,
    rate_limit::RateLimitConfig,
};
use serde_json::Value;
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"integration-access-secret-0123456789";
pub const REFRESH_SECRET: &[u8] = b"integration-refresh-secret-0123456789";
pub const PASSWORD: &str = "correct horse battery staple";

/// Codec sharing the test app's secrets, for minting and checking tokens directly.
pub fn jwt() -> JwtConfig {
    JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET)
}

/// App with generous rate limits, sharing its database with the caller.
pub async fn create_test_app() -> (Router, Database) {
    create_test_app_with_limits(1000, 1000).await
}

pub async fn create_test_app_with_limits(
    login_per_minute: u32,
    signup_per_minute: u32,
) -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt: jwt(),
        secure_cookies: true,
        rate_limit: Arc::new(RateLimitConfig::new(
            login_per_minute,
            signup_per_minute,
            IpSource::Socket,
        )),
    };
    (create_app(config), db)
}

/// Send a request as if from 127.0.0.1.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    send_from(app, request, [127, 0, 0, 1]).await
}

pub async fn send_from(app: &Router, mut request: Request<Body>, ip: [u8; 4]) -> Response<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A request with no body and no Content-Type.
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// A JSON-typed request whose body is sent verbatim.
pub fn raw_json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap()
        .to_string()
}

/// Extract the refresh token value from a Set-Cookie header.
pub fn refresh_token_from(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("refreshToken="))
        .expect("not a refreshToken cookie")
        .to_string()
}

/// A signed-up user.
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn signup(app: &Router, username: &str) -> TestUser {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), 201);

    let cookie = set_cookie(&response);
    let json = body_json(response).await;

    TestUser {
        id: json["data"]["id"].as_str().unwrap().to_string(),
        username: username.to_string(),
        access_token: json["token"].as_str().unwrap().to_string(),
        refresh_token: refresh_token_from(&cookie),
    }
}
