#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use jsonwebtoken::{EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};
use tokencookie::{
    ServerConfig, create_app,
    db::Database,
    jwt::{Claims, JwtConfig, TokenLifetimes, TokenType},
    password::hash_password,
};

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";

pub const LIFETIMES: TokenLifetimes = TokenLifetimes {
    access: 300,
    refresh: 86400,
};

pub const USERNAME: &str = "testuser";
pub const PASSWORD: &str = "testpassword";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

/// Create a test app backed by an in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        lifetimes: LIFETIMES,
        secure_cookies: false,
    };
    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::new(JWT_SECRET, LIFETIMES),
    }
}

/// Create an active user with the given credentials and return its ID.
pub async fn create_user(db: &Database, username: &str, password: &str) -> i64 {
    let hash = hash_password(password).expect("Failed to hash password");
    db.users()
        .create(username, &hash)
        .await
        .expect("Failed to create user")
}

/// A correctly signed token whose `exp` is already in the past.
pub fn expired_token(token_type: TokenType, user_id: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        token_type,
        user_id,
        jti: uuid::Uuid::new_v4().simple().to_string(),
        iat: now - 1000,
        exp: now - 500,
        persistent: true,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Find the Set-Cookie header for a cookie name.
pub fn find_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .find(|c| c.starts_with(&prefix))
        .map(|c| c.as_str())
}

/// Value part of a Set-Cookie header.
pub fn cookie_value(set_cookie: &str) -> &str {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value)
        .unwrap_or("")
}

/// Max-Age attribute of a Set-Cookie header, if any.
pub fn cookie_max_age(set_cookie: &str) -> Option<u64> {
    set_cookie
        .split(';')
        .map(str::trim)
        .find_map(|attr| attr.strip_prefix("Max-Age="))
        .and_then(|v| v.parse().ok())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
