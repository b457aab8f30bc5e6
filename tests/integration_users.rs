mod common;

use axum::http::StatusCode;
use common::test_app;
use devcamper::modules::users::model::UserRole;
use serde_json::json;

#[tokio::test]
async fn test_users_routes_require_admin() {
    let app = test_app();
    let (_, publisher_token) = app
        .user_with_token("Publisher", "publisher@gmail.com", UserRole::Publisher)
        .await;

    let anonymous = app.get("/api/v1/users", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let publisher = app.get("/api/v1/users", Some(&publisher_token)).await;
    assert_eq!(publisher.status, StatusCode::FORBIDDEN);
    assert_eq!(
        publisher.body["error"],
        "User role publisher is not authorized to access this route"
    );
}

#[tokio::test]
async fn test_admin_lists_users_without_secrets() {
    let app = test_app();
    let (_, admin_token) = app
        .user_with_token("Admin", "admin@gmail.com", UserRole::Admin)
        .await;
    app.user_with_token("Alice", "alice@gmail.com", UserRole::User)
        .await;
    app.user_with_token("Bob", "bob@gmail.com", UserRole::Publisher)
        .await;

    let response = app
        .get("/api/v1/users?sort=name&select=name,email,password", Some(&admin_token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 3);
    assert_eq!(response.body["data"][0]["name"], "Admin");
    for user in response.body["data"].as_array().unwrap() {
        assert!(user.get("password").is_none());
    }

    let publishers = app
        .get("/api/v1/users?role=publisher", Some(&admin_token))
        .await;
    assert_eq!(publishers.body["count"], 1);
    assert_eq!(publishers.body["data"][0]["email"], "bob@gmail.com");

    let by_secret = app
        .get("/api/v1/users?password=anything", Some(&admin_token))
        .await;
    assert_eq!(by_secret.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_user_crud() {
    let app = test_app();
    let (_, admin_token) = app
        .user_with_token("Admin", "admin@gmail.com", UserRole::Admin)
        .await;

    let created = app
        .request(
            "POST",
            "/api/v1/users",
            Some(&admin_token),
            Some(json!({
                "name": "Kevin Smith",
                "email": "Kevin@Gmail.com",
                "password": "123456",
                "role": "publisher"
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["email"], "kevin@gmail.com");
    assert!(created.body["data"].get("password").is_none());
    let uri = format!(
        "/api/v1/users/{}",
        created.body["data"]["_id"].as_str().unwrap()
    );

    let fetched = app.get(&uri, Some(&admin_token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["role"], "publisher");

    let updated = app
        .request("PUT", &uri, Some(&admin_token), Some(json!({"name": "Kevin S."})))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["name"], "Kevin S.");
    assert_eq!(updated.body["data"]["email"], "kevin@gmail.com");

    app.login("kevin@gmail.com", "123456").await;

    let deleted = app.request("DELETE", &uri, Some(&admin_token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({"success": true, "data": {}}));

    let gone = app.get(&uri, Some(&admin_token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_user_token_stops_working() {
    let app = test_app();
    let (_, admin_token) = app
        .user_with_token("Admin", "admin@gmail.com", UserRole::Admin)
        .await;
    let (user, user_token) = app
        .user_with_token("Alice", "alice@gmail.com", UserRole::User)
        .await;

    app.request(
        "DELETE",
        &format!("/api/v1/users/{}", user.id),
        Some(&admin_token),
        None,
    )
    .await;

    let me = app.get("/api/v1/auth/me", Some(&user_token)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = test_app();

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let openapi = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(openapi.status, StatusCode::OK);
    assert!(openapi.body["paths"].get("/api/v1/bootcamps").is_some());
    assert!(
        openapi.body["paths"]
            .get("/api/v1/auth/resetpassword/{reset_token}")
            .is_some()
    );
}
