use std::path::Path;
use std::sync::Arc;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use clap::Parser;
use serde_json::{json, Value};
use tower::ServiceExt;
use crate::config::Config;
use crate::controller::{router_endpoints, AppState};
use crate::repositories::memory_repo::MemoryStore;

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    set_cookie: Option<String>,
    body: Value,
    raw: Vec<u8>,
}

fn test_app(upload_dir: &Path) -> Router {
    let config = Config::try_parse_from([
        "staybook",
        "--jwt-secret",
        "test-secret",
        "--upload-dir",
        upload_dir.to_str().unwrap(),
    ])
    .unwrap();

    let state = AppState::new(Arc::new(config), Arc::new(MemoryStore::new())).unwrap();
    router_endpoints(state)
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let raw = hyper::body::to_bytes(response.into_body()).await.unwrap().to_vec();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        set_cookie,
        body,
        raw,
    }
}

async fn call(app: &Router, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send(app, request).await
}

/// Registers and logs in, returning the user id and a `token=...` cookie pair.
async fn sign_up(app: &Router, name: &str, email: &str, password: &str) -> (String, String) {
    let registered = call(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let logged_in = call(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(logged_in.status, StatusCode::OK);

    let cookie = logged_in
        .set_cookie
        .expect("login sets a session cookie")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    (registered.body["id"].as_str().unwrap().to_string(), cookie)
}

fn listing(price: f64) -> Value {
    json!({
        "title": "Seaside loft",
        "address": "1 Beach Rd",
        "addedPhotos": [],
        "perks": ["wifi"],
        "checkIn": "14:00",
        "checkOut": "11:00",
        "maxGuests": 2,
        "price": price,
    })
}

#[tokio::test]
async fn register_login_then_profile_returns_same_user() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (user_id, cookie) = sign_up(&app, "Alice", "a@x.com", "pw1").await;
    assert!(cookie.starts_with("token="));

    let profile = call(&app, Method::GET, "/profile", Some(&cookie), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body, json!({ "name": "Alice", "email": "a@x.com", "id": user_id }));
}

#[tokio::test]
async fn session_cookie_flags_are_set() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Alice", "email": "a@x.com", "password": "pw1" })),
    )
    .await;
    let logged_in = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "pw1" })),
    )
    .await;

    let set_cookie = logged_in.set_cookie.unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(!logged_in.body.to_string().contains("pw1"));
}

#[tokio::test]
async fn register_response_never_contains_password() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let registered = call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Alice", "email": "a@x.com", "password": "hunter2" })),
    )
    .await;

    assert_eq!(registered.status, StatusCode::CREATED);
    let text = String::from_utf8(registered.raw).unwrap();
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("password"));
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    sign_up(&app, "Alice", "a@x.com", "pw1").await;
    let again = call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Alice 2", "email": "a@x.com", "password": "pw2" })),
    )
    .await;

    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"]["code"], "conflict");
}

#[tokio::test]
async fn invalid_registration_lists_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = call(&app, Method::POST, "/register", None, Some(json!({ "email": "x" }))).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = response.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "password"]);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    sign_up(&app, "Alice", "a@x.com", "pw1").await;

    let response = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie.is_none());
}

#[tokio::test]
async fn profile_without_cookie_is_null_and_bad_cookie_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let anonymous = call(&app, Method::GET, "/profile", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body, Value::Null);

    let forged = call(&app, Method::GET, "/profile", Some("token=abc.def.ghi"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookie_and_revokes_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let (_, cookie) = sign_up(&app, "Alice", "a@x.com", "pw1").await;

    let logged_out = call(&app, Method::POST, "/logout", Some(&cookie), None).await;
    assert_eq!(logged_out.status, StatusCode::OK);
    assert!(logged_out.set_cookie.unwrap().starts_with("token=;"));

    let profile = call(&app, Method::GET, "/profile", Some(&cookie), None).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutating_place_routes_require_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let created = call(&app, Method::POST, "/places", None, Some(listing(100.0))).await;
    assert_eq!(created.status, StatusCode::UNAUTHORIZED);

    let mine = call(&app, Method::GET, "/user-places", None, None).await;
    assert_eq!(mine.status, StatusCode::UNAUTHORIZED);

    let all = call(&app, Method::GET, "/places", None, None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body, json!([]));
}

#[tokio::test]
async fn non_owner_cannot_change_price() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let (_, alice) = sign_up(&app, "Alice", "a@x.com", "pw1").await;
    let (_, bob) = sign_up(&app, "Bob", "b@x.com", "pw2").await;

    let created = call(&app, Method::POST, "/places", Some(&alice), Some(listing(100.0))).await;
    assert_eq!(created.status, StatusCode::OK);
    let place_id = created.body["id"].as_str().unwrap().to_string();

    let hijack = call(
        &app,
        Method::PUT,
        "/places",
        Some(&bob),
        Some(json!({ "id": place_id, "price": 1 })),
    )
    .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let place = call(&app, Method::GET, &format!("/places/{}", place_id), None, None).await;
    assert_eq!(place.body["price"], json!(100.0));

    let update = call(
        &app,
        Method::PUT,
        "/places",
        Some(&alice),
        Some(json!({ "id": place_id, "price": 120 })),
    )
    .await;
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(update.body, json!("ok"));

    let place = call(&app, Method::GET, &format!("/places/{}", place_id), None, None).await;
    assert_eq!(place.body["price"], json!(120.0));
}

#[tokio::test]
async fn unknown_place_is_null() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = call(&app, Method::GET, "/places/does-not-exist", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Value::Null);
}

#[tokio::test]
async fn bookings_are_private_to_their_owner() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let (_, alice) = sign_up(&app, "Alice", "a@x.com", "pw1").await;
    let (_, bob) = sign_up(&app, "Bob", "b@x.com", "pw2").await;

    let place = call(&app, Method::POST, "/places", Some(&alice), Some(listing(100.0))).await;
    let place_id = place.body["id"].as_str().unwrap().to_string();

    let booking = call(
        &app,
        Method::POST,
        "/bookings",
        Some(&bob),
        Some(json!({
            "place": place_id,
            "checkIn": "2024-06-01",
            "checkOut": "2024-06-03",
            "numberOfGuests": 2,
            "name": "Bob",
            "phone": "555-0101",
            "price": 200,
        })),
    )
    .await;
    assert_eq!(booking.status, StatusCode::OK);
    let booking_id = booking.body["id"].as_str().unwrap().to_string();

    let bobs = call(&app, Method::GET, "/bookings", Some(&bob), None).await;
    assert_eq!(bobs.body.as_array().unwrap().len(), 1);
    assert_eq!(bobs.body[0]["place"]["id"], json!(place_id));
    assert_eq!(bobs.body[0]["checkIn"], json!("2024-06-01"));

    let alices = call(&app, Method::GET, "/bookings", Some(&alice), None).await;
    assert_eq!(alices.body, json!([]));

    let own = call(&app, Method::GET, &format!("/bookings/{}", booking_id), Some(&bob), None).await;
    assert_eq!(own.status, StatusCode::OK);

    let peek = call(&app, Method::GET, &format!("/bookings/{}", booking_id), Some(&alice), None).await;
    assert_eq!(peek.status, StatusCode::FORBIDDEN);

    let missing = call(&app, Method::GET, "/bookings/nope", Some(&alice), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_by_unreachable_link_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = call(
        &app,
        Method::POST,
        "/upload-by-link",
        None,
        Some(json!({ "link": "http://127.0.0.1:1/photo.jpg" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"]["code"], "fetch_error");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

const BOUNDARY: &str = "XBOUNDARYX";

/// A multipart `/upload` request carrying `count` small png parts.
fn photo_upload(count: usize) -> Request<Body> {
    let mut body = String::new();
    for i in 0..count {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"photos\"; filename=\"beach{i}.png\"\r\n\
             Content-Type: image/png\r\n\r\npng-bytes\r\n",
            b = BOUNDARY,
            i = i
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn multipart_upload_is_stored_and_served() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let uploaded = send(&app, photo_upload(1)).await;
    assert_eq!(uploaded.status, StatusCode::OK);
    let file_id = uploaded.body[0].as_str().unwrap().to_string();
    assert!(file_id.ends_with(".png"));

    let served = call(&app, Method::GET, &format!("/uploads/{}", file_id), None, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.raw, b"png-bytes");
}

#[tokio::test]
async fn upload_accepts_exactly_the_file_limit() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let uploaded = send(&app, photo_upload(100)).await;

    assert_eq!(uploaded.status, StatusCode::OK);
    assert_eq!(uploaded.body.as_array().unwrap().len(), 100);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 100);
}

#[tokio::test]
async fn upload_over_the_file_limit_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let rejected = send(&app, photo_upload(101)).await;

    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected.body["error"]["code"], "validation_error");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn malformed_json_body_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["code"], "validation_error");
    assert_eq!(response.body["error"]["details"][0]["field"], "body");

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .body(Body::from("{}"))
        .unwrap();
    let response = send(&app, untyped).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    for uri in ["/health", "/places", "/nowhere"] {
        let response = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(
            response.headers[header::CONTENT_SECURITY_POLICY],
            "default-src 'self'; script-src 'self'; style-src 'self'"
        );
        assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = call(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let health = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
}
