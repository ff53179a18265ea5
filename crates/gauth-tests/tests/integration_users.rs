// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # User Management Integration Tests
//!
//! - `test_access_*`: The admin role gate
//! - `test_list_*`: Pagination and search
//! - `test_create_*`: User creation
//! - `test_get_*`, `test_update_*`, `test_delete_*`: Single-user operations

use gauth_core::CredentialStore;
use gauth_tests::prelude::*;
use serde_json::{json, Value};
use uuid::Uuid;

async fn role_id(app: &TestApp, name: &str) -> Uuid {
    app.store
        .find_role_by_name(name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("Role {} is not seeded", name))
        .id
}

fn usernames(body: &Value) -> Vec<String> {
    body["users"]
        .as_array()
        .expect("users array")
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Access Control
// =============================================================================

#[tokio::test]
async fn test_access_requires_admin_role() {
    let app = TestApp::new().await;
    app.create_user("plain", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_tokens("plain", TEST_PASSWORD).await;
    let admin = app.admin().await;

    app.get("/api/users", Some(&tokens.access_token))
        .await
        .assert_error(StatusCode::FORBIDDEN, "Insufficient permissions");
    app.get(&format!("/api/users/{}", admin.id), Some(&tokens.access_token))
        .await
        .assert_error(StatusCode::FORBIDDEN, "Insufficient permissions");
    app.delete(&format!("/api/users/{}", admin.id), Some(&tokens.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // The admin was not touched.
    assert!(app.store.get_user(admin.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_access_requires_authentication() {
    let app = TestApp::new().await;

    app.get("/api/users", None)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_user_without_roles_forbidden() {
    let app = TestApp::new().await;
    app.create_user("roleless", TEST_PASSWORD, &[]).await;
    let tokens = app.login_tokens("roleless", TEST_PASSWORD).await;

    app.get("/api/users", Some(&tokens.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    // Their own profile stays reachable.
    app.get("/api/auth/me", Some(&tokens.access_token))
        .await
        .assert_status(StatusCode::OK);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::new().await;
    for i in 0..24 {
        app.create_user(&format!("member{:02}", i), TEST_PASSWORD, &["user"])
            .await;
    }
    let tokens = app.login_admin().await;

    let response = app
        .get("/api/users?page=2&limit=10", Some(&tokens.access_token))
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["users"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["current_page"], 2);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["total_items"], 25);
    assert_eq!(body["pagination"]["items_per_page"], 10);
    assert_no_secret_fields(&body);

    let last = app
        .get("/api/users?page=3&limit=10", Some(&tokens.access_token))
        .await
        .json();
    assert_eq!(last["users"].as_array().unwrap().len(), 5);

    let beyond = app
        .get("/api/users?page=9&limit=10", Some(&tokens.access_token))
        .await
        .json();
    assert!(beyond["users"].as_array().unwrap().is_empty());
    assert_eq!(beyond["pagination"]["total_items"], 25);
}

#[tokio::test]
async fn test_list_pages_do_not_overlap() {
    let app = TestApp::new().await;
    for i in 0..6 {
        app.create_user(&format!("pager{}", i), TEST_PASSWORD, &["user"])
            .await;
    }
    let tokens = app.login_admin().await;

    let first = usernames(
        &app.get("/api/users?page=1&limit=4", Some(&tokens.access_token))
            .await
            .json(),
    );
    let second = usernames(
        &app.get("/api/users?page=2&limit=4", Some(&tokens.access_token))
            .await
            .json(),
    );

    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 3);
    assert!(first.iter().all(|name| !second.contains(name)));
}

#[tokio::test]
async fn test_list_normalizes_out_of_range_parameters() {
    let app = TestApp::new().await;
    let tokens = app.login_admin().await;

    for query in [
        "page=0&limit=0",
        "page=-3&limit=101",
        "page=abc&limit=xyz",
        "",
    ] {
        let response = app
            .get(&format!("/api/users?{}", query), Some(&tokens.access_token))
            .await;
        response.assert_status(StatusCode::OK);

        let body = response.json();
        assert_eq!(body["pagination"]["current_page"], 1, "query: {}", query);
        assert_eq!(body["pagination"]["items_per_page"], 10, "query: {}", query);
    }

    let body = app
        .get("/api/users?limit=100", Some(&tokens.access_token))
        .await
        .json();
    assert_eq!(body["pagination"]["items_per_page"], 100);
}

#[tokio::test]
async fn test_list_search() {
    let app = TestApp::new().await;
    app.create_user("alice", TEST_PASSWORD, &["user"]).await;
    app.create_user("alicia", TEST_PASSWORD, &["user"]).await;
    app.create_user("bob", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    let body = app
        .get("/api/users?search=ALIC", Some(&tokens.access_token))
        .await
        .json();
    let mut names = usernames(&body);
    names.sort();
    assert_eq!(names, vec!["alice", "alicia"]);
    assert_eq!(body["pagination"]["total_items"], 2);

    // Email addresses are searched too.
    let body = app
        .get("/api/users?search=bob@example", Some(&tokens.access_token))
        .await
        .json();
    assert_eq!(usernames(&body), vec!["bob"]);
}

#[tokio::test]
async fn test_list_search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    app.create_user("snake_case", TEST_PASSWORD, &["user"]).await;
    app.create_user("plain", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    let body = app
        .get("/api/users?search=_", Some(&tokens.access_token))
        .await
        .json();
    assert_eq!(usernames(&body), vec!["snake_case"]);
    assert_eq!(body["pagination"]["total_items"], 1);

    let body = app
        .get("/api/users?search=%25", Some(&tokens.access_token))
        .await
        .json();
    assert_eq!(body["pagination"]["total_items"], 0);
}

#[tokio::test]
async fn test_list_page_beyond_range_is_empty() {
    let app = TestApp::new().await;
    app.create_user("alice", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    let response = app
        .get(
            "/api/users?page=9223372036854775807&limit=100",
            Some(&tokens.access_token),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json();
    assert!(body["users"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["current_page"], 9223372036854775807u64);
    assert_eq!(body["pagination"]["total_items"], 2);
}

#[tokio::test]
async fn test_list_excludes_deleted_users() {
    let app = TestApp::new().await;
    let gone = app.create_user("ghost", TEST_PASSWORD, &["user"]).await;
    app.store.delete_user(gone.id).await.unwrap();
    let tokens = app.login_admin().await;

    let body = app.get("/api/users", Some(&tokens.access_token)).await.json();
    assert_eq!(usernames(&body), vec![AdminFixtures::username()]);
    assert_eq!(body["pagination"]["total_items"], 1);
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn test_create_user_with_roles() {
    let app = TestApp::new().await;
    let tokens = app.login_admin().await;
    let user_role = role_id(&app, "user").await;

    let response = app
        .post(
            "/api/users",
            json!({
                "username": "dave",
                "email": "dave@example.com",
                "password": "dave-pass",
                "first_name": "Dave",
                "role_ids": [user_role],
            }),
            Some(&tokens.access_token),
        )
        .await;
    response.assert_status(StatusCode::CREATED);

    let body = response.json();
    assert_eq!(body["username"], "dave");
    assert_eq!(body["first_name"], "Dave");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_verified"], false);
    assert_role_names(&body, &["user"]);
    assert_no_secret_fields(&body);

    // The new account can sign in.
    app.login("dave", "dave-pass")
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_ignores_unknown_roles() {
    let app = TestApp::new().await;
    let tokens = app.login_admin().await;

    let response = app
        .post(
            "/api/users",
            json!({
                "username": "erin",
                "email": "erin@example.com",
                "password": "erin-pass",
                "role_ids": [Uuid::new_v4()],
            }),
            Some(&tokens.access_token),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_role_names(&response.json(), &[]);
}

#[tokio::test]
async fn test_create_user_conflict() {
    let app = TestApp::new().await;
    app.create_user("taken", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    for (username, email) in [
        ("taken", "fresh@example.com"),
        ("fresh", "taken@example.com"),
    ] {
        app.post(
            "/api/users",
            json!({ "username": username, "email": email, "password": "long-enough" }),
            Some(&tokens.access_token),
        )
        .await
        .assert_error(StatusCode::CONFLICT, "Username or email already exists");
    }
}

#[tokio::test]
async fn test_create_user_invalid_input() {
    let app = TestApp::new().await;
    let tokens = app.login_admin().await;

    for body in [
        json!({ "username": "ab", "email": "ab@example.com", "password": "long-enough" }),
        json!({ "username": "frank", "email": "not-an-email", "password": "long-enough" }),
        json!({ "username": "frank", "email": "frank@example.com", "password": "short" }),
        json!({ "username": "frank", "email": "frank@example.com" }),
    ] {
        app.post("/api/users", body, Some(&tokens.access_token))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    assert!(app.store.find_user_by_login("frank").await.unwrap().is_none());
}

// =============================================================================
// Single User
// =============================================================================

#[tokio::test]
async fn test_get_user() {
    let app = TestApp::new().await;
    let user = app.create_user("grace", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    let response = app
        .get(&format!("/api/users/{}", user.id), Some(&tokens.access_token))
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["email"], "grace@example.com");
    assert_role_names(&body, &["user"]);
    assert_no_secret_fields(&body);
}

#[tokio::test]
async fn test_get_user_malformed_and_missing_ids() {
    let app = TestApp::new().await;
    let tokens = app.login_admin().await;

    app.get("/api/users/not-a-uuid", Some(&tokens.access_token))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Invalid user ID");
    app.get(
        &format!("/api/users/{}", Uuid::new_v4()),
        Some(&tokens.access_token),
    )
    .await
    .assert_error(StatusCode::NOT_FOUND, "User not found");
}

#[tokio::test]
async fn test_update_user_fields_and_roles() {
    let app = TestApp::new().await;
    let user = app.create_user("heidi", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;
    let admin_role = role_id(&app, "admin").await;

    let response = app
        .put(
            &format!("/api/users/{}", user.id),
            json!({
                "last_name": "Klum",
                "is_verified": true,
                "role_ids": [admin_role],
            }),
            Some(&tokens.access_token),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["username"], "heidi");
    assert_eq!(body["last_name"], "Klum");
    assert_eq!(body["is_verified"], true);
    assert_role_names(&body, &["admin"]);

    // Omitting role_ids leaves the role set alone.
    let body = app
        .put(
            &format!("/api/users/{}", user.id),
            json!({ "first_name": "Heidi" }),
            Some(&tokens.access_token),
        )
        .await
        .json();
    assert_role_names(&body, &["admin"]);

    // An empty list clears it.
    let body = app
        .put(
            &format!("/api/users/{}", user.id),
            json!({ "role_ids": [] }),
            Some(&tokens.access_token),
        )
        .await
        .json();
    assert_role_names(&body, &[]);
}

#[tokio::test]
async fn test_update_user_conflict_and_missing() {
    let app = TestApp::new().await;
    app.create_user("ivan", TEST_PASSWORD, &["user"]).await;
    let judy = app.create_user("judy", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    app.put(
        &format!("/api/users/{}", judy.id),
        json!({ "username": "ivan" }),
        Some(&tokens.access_token),
    )
    .await
    .assert_error(StatusCode::CONFLICT, "Username or email already exists");

    // Keeping one's own username is not a collision.
    app.put(
        &format!("/api/users/{}", judy.id),
        json!({ "username": "judy", "email": "judy@example.com" }),
        Some(&tokens.access_token),
    )
    .await
    .assert_status(StatusCode::OK);

    app.put(
        &format!("/api/users/{}", Uuid::new_v4()),
        json!({ "first_name": "Nobody" }),
        Some(&tokens.access_token),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_deactivation_blocks_login() {
    let app = TestApp::new().await;
    let user = app.create_user("mallory", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;

    app.put(
        &format!("/api/users/{}", user.id),
        json!({ "is_active": false }),
        Some(&tokens.access_token),
    )
    .await
    .assert_status(StatusCode::OK);

    app.login("mallory", TEST_PASSWORD)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_user() {
    let app = TestApp::new().await;
    let user = app.create_user("oscar", TEST_PASSWORD, &["user"]).await;
    let tokens = app.login_admin().await;
    let path = format!("/api/users/{}", user.id);

    app.delete(&path, Some(&tokens.access_token))
        .await
        .assert_message("User deleted successfully");

    app.get(&path, Some(&tokens.access_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.delete(&path, Some(&tokens.access_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.login("oscar", TEST_PASSWORD)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
