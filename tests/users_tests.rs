mod common;

use axum::http::{StatusCode, header};
use common::{
    PASSWORD, body_json, body_text, create_test_app, delete, empty_request, get, json_request,
    jwt, raw_json_request, refresh_token_from, send, set_cookie, signup, with_bearer,
};
use serde_json::json;

fn login(username: &str, password: &str) -> axum::http::Request<axum::body::Body> {
    json_request(
        "POST",
        "/api/users/login",
        json!({ "username": username, "password": password }),
    )
}

#[tokio::test]
async fn test_create_user_success() {
    let (app, _) = create_test_app().await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({
                "username": "  alice ",
                "email": "alice@example.com",
                "password": PASSWORD,
                "displayName": "Alice",
                "bio": "",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));

    let json = body_json(response).await;
    assert_eq!(json["message"], "User created successfully");
    assert_eq!(json["data"]["username"], "alice");
    assert_eq!(json["data"]["displayName"], "Alice");
    assert!(json["data"].get("bio").is_none());
    assert!(json["data"].get("passwordHash").is_none());
    assert!(json["data"].get("password_hash").is_none());

    let claims = jwt()
        .verify_access_token(json["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.username, "alice");

    let refresh = jwt()
        .verify_refresh_token(&refresh_token_from(&cookie))
        .unwrap();
    assert_eq!(refresh.username, "alice");
}

#[tokio::test]
async fn test_create_user_missing_fields() {
    let (app, _) = create_test_app().await;

    for body in [
        json!({ "email": "a@example.com", "password": PASSWORD }),
        json!({ "username": "alice", "password": PASSWORD }),
        json!({ "username": "alice", "email": "a@example.com" }),
        json!({ "username": "   ", "email": "a@example.com", "password": PASSWORD }),
    ] {
        let response = send(&app, json_request("POST", "/api/users", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "username, email and password are required"
        );
    }
}

#[tokio::test]
async fn test_create_user_unreadable_body() {
    let (app, _) = create_test_app().await;

    for request in [
        empty_request("POST", "/api/users"),
        raw_json_request("POST", "/api/users", ""),
        raw_json_request("POST", "/api/users", "{not json"),
        raw_json_request(
            "POST",
            "/api/users",
            r#"{"username": 5, "email": "a@example.com", "password": "x"}"#,
        ),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            body_json(response).await,
            json!({ "error": "username, email and password are required" })
        );
    }
}

#[tokio::test]
async fn test_create_user_duplicate() {
    let (app, _) = create_test_app().await;
    signup(&app, "alice").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({ "username": "Alice", "email": "other@example.com", "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Failed to create user");
}

#[tokio::test]
async fn test_login_success() {
    let (app, _) = create_test_app().await;
    signup(&app, "alice").await;

    let response = send(&app, login("alice", PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let cookie = set_cookie(&response);
    let token = body_text(response).await;
    assert_eq!(jwt().verify_access_token(&token).unwrap().username, "alice");
    assert_eq!(
        jwt()
            .verify_refresh_token(&refresh_token_from(&cookie))
            .unwrap()
            .username,
        "alice"
    );
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = create_test_app().await;
    signup(&app, "alice").await;

    let wrong_password = send(&app, login("alice", "not the password")).await;
    let unknown_user = send(&app, login("mallory", PASSWORD)).await;
    let missing_fields = send(
        &app,
        json_request("POST", "/api/users/login", json!({ "username": "alice" })),
    )
    .await;

    for response in [wrong_password, unknown_user, missing_fields] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Username or password is incorrect" })
        );
    }
}

#[tokio::test]
async fn test_login_unreadable_body() {
    let (app, _) = create_test_app().await;
    signup(&app, "alice").await;

    for request in [
        empty_request("POST", "/api/users/login"),
        raw_json_request("POST", "/api/users/login", "{not json"),
        raw_json_request(
            "POST",
            "/api/users/login",
            r#"{"username": "alice", "password": 12345}"#,
        ),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Username or password is incorrect" })
        );
    }
}

#[tokio::test]
async fn test_login_with_corrupt_hash_is_rejected() {
    let (app, db) = create_test_app().await;
    signup(&app, "alice").await;

    sqlx::query("UPDATE users SET password_hash = 'not-a-phc-string'")
        .execute(db.pool())
        .await
        .unwrap();

    let response = send(&app, login("alice", PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_newest_first() {
    let (app, _) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    signup(&app, "bob").await;

    let response = send(&app, with_bearer(get("/api/users"), &alice.access_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let names: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bob", "alice"]);
}

#[tokio::test]
async fn test_get_user() {
    let (app, _) = create_test_app().await;
    let alice = signup(&app, "alice").await;

    let response = send(
        &app,
        with_bearer(get(&format!("/api/users/{}", alice.id)), &alice.access_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], alice.id.as_str());

    let response = send(
        &app,
        with_bearer(get("/api/users/not-a-uuid"), &alice.access_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid userId");

    let response = send(
        &app,
        with_bearer(
            get("/api/users/67e55044-10b1-426f-9247-bb680e5fe0c8"),
            &alice.access_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User not found");
}

#[tokio::test]
async fn test_update_user() {
    let (app, _) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    signup(&app, "bob").await;
    let uri = format!("/api/users/{}", alice.id);

    let response = send(
        &app,
        with_bearer(
            json_request(
                "PUT",
                &uri,
                json!({ "username": "alicia", "email": "alicia@example.com", "bio": "hi" }),
            ),
            &alice.access_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "User updated successfully");
    assert_eq!(json["data"]["username"], "alicia");
    assert_eq!(json["data"]["bio"], "hi");

    let response = send(
        &app,
        with_bearer(
            json_request("PUT", &uri, json!({ "username": "alicia" })),
            &alice.access_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "username and email are required"
    );

    let response = send(
        &app,
        with_bearer(
            json_request(
                "PUT",
                &uri,
                json!({ "username": "bob", "email": "alicia@example.com" }),
            ),
            &alice.access_token,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Failed to update user");
}

#[tokio::test]
async fn test_delete_user() {
    let (app, _) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let uri = format!("/api/users/{}", alice.id);

    let response = send(&app, with_bearer(delete(&uri), &alice.access_token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, with_bearer(delete(&uri), &alice.access_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_routes_require_bearer() {
    let (app, _) = create_test_app().await;
    let alice = signup(&app, "alice").await;
    let uri = format!("/api/users/{}", alice.id);

    for request in [
        get(&uri),
        delete(&uri),
        json_request("PUT", &uri, json!({ "username": "x", "email": "x@example.com" })),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["message"],
            "Missing or invalid Authorization header"
        );
    }
}
