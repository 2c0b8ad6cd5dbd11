mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::{request, seed_user, test_app};
use mailpost::rbac::Role;

#[tokio::test]
async fn register_verify_and_create_client_flow() {
    let app = test_app().await;

    let (status, body) = request(
        &app.router,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": "new@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "member");

    // Verification email went through the mailer with a token link
    let mail = app.mailer.last_sent().expect("verification email");
    assert_eq!(mail.recipients, vec!["new@example.com".to_string()]);
    let token = mail
        .body
        .split("token=")
        .nth(1)
        .expect("token in body")
        .trim()
        .to_string();

    let (status, body) = request(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "new@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bearer = body["token"].as_str().expect("token").to_string();

    // Unverified users may not create content
    let (status, _) = request(
        &app.router,
        "POST",
        "/clients",
        Some(&bearer),
        Some(json!({"email": "c@example.com", "full_name": "C"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app.router,
        "GET",
        &format!("/auth/verify-email?token={}", token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app.router,
        "POST",
        "/clients",
        Some(&bearer),
        Some(json!({"email": "c@example.com", "full_name": "C"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "c@example.com");

    // Second register for the same address is rejected
    let (status, _) = request(
        &app.router,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": "new@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_token_and_bad_login_are_rejected() {
    let app = test_app().await;

    let (status, _) = request(&app.router, "GET", "/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app.router, "GET", "/clients", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owners_and_managers_see_mailings_others_do_not() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;
    let (_, other_token) = seed_user(&app.pool, "other@example.com", Role::Member, true).await;
    let (_, manager_token) = seed_user(&app.pool, "boss@example.com", Role::Manager, true).await;

    let (status, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "Hello", "body": "World"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    let uri = format!("/mailings/{}", mailing_id);
    let (status, _) = request(&app.router, "GET", &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app.router, "GET", &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = request(&app.router, "GET", &uri, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Managers view but do not edit
    let (status, _) = request(
        &app.router,
        "PUT",
        &uri,
        Some(&manager_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "weekly",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app.router,
        "GET",
        "/manager/mailings",
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, list) = request(
        &app.router,
        "GET",
        "/manager/mailings",
        Some(&manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn mailing_cannot_reference_foreign_clients() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;
    let (_, other_token) = seed_user(&app.pool, "other@example.com", Role::Member, true).await;

    let (status, foreign_client) = request(
        &app.router,
        "POST",
        "/clients",
        Some(&other_token),
        Some(json!({"email": "x@example.com", "full_name": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "S", "body": "B"})),
    )
    .await;

    let (status, _) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": message["id"],
            "client_ids": [foreign_client["id"]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mailing_update_cannot_reference_foreign_message() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;
    let (_, other_token) = seed_user(&app.pool, "other@example.com", Role::Member, true).await;

    let (_, own_message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "Mine", "body": "Mine"})),
    )
    .await;
    let (_, foreign_message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&other_token),
        Some(json!({"subject": "Secret", "body": "Secret"})),
    )
    .await;

    let (status, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": own_message["id"],
            "client_ids": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    // Swapping in another user's message is rejected the same as on create
    let (status, _) = request(
        &app.router,
        "PUT",
        &format!("/mailings/{}", mailing_id),
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": foreign_message["id"],
            "client_ids": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let message_id = sqlx::query_scalar::<_, i64>("SELECT message_id FROM mailings WHERE id = ?")
        .bind(mailing_id)
        .fetch_one(&app.pool)
        .await
        .expect("message_id");
    assert_eq!(Some(message_id), own_message["id"].as_i64());
}

#[tokio::test]
async fn mailing_update_without_status_keeps_current_one() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;

    let (_, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "S", "body": "B"})),
    )
    .await;
    let (_, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "status": "started",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    let (status, _) = request(
        &app.router,
        "PUT",
        &format!("/mailings/{}", mailing_id),
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "weekly",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, mailing) = request(
        &app.router,
        "GET",
        &format!("/mailings/{}", mailing_id),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(mailing["mailing"]["status"], "started");
    assert_eq!(mailing["mailing"]["periodicity"], "weekly");
}

#[tokio::test]
async fn closed_mailing_stays_closed_under_manager_toggle() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;
    let (_, manager_token) = seed_user(&app.pool, "boss@example.com", Role::Manager, true).await;

    let (_, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "S", "body": "B"})),
    )
    .await;
    let (_, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    let close_uri = format!("/mailings/{}/close", mailing_id);
    let (status, _) = request(&app.router, "POST", &close_uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let toggle_uri = format!("/manager/mailings/{}/toggle", mailing_id);
    let (status, _) = request(&app.router, "POST", &toggle_uri, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let db_status = sqlx::query_scalar::<_, String>("SELECT status FROM mailings WHERE id = ?")
        .bind(mailing_id)
        .fetch_one(&app.pool)
        .await
        .expect("status");
    assert_eq!(db_status, "closed");
}

#[tokio::test]
async fn manager_toggles_mailing_and_user() {
    let app = test_app().await;
    let (user_id, user_token) = seed_user(&app.pool, "user@example.com", Role::Member, true).await;
    let (_, manager_token) = seed_user(&app.pool, "boss@example.com", Role::Manager, true).await;

    let (_, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&user_token),
        Some(json!({"subject": "S", "body": "B"})),
    )
    .await;
    let (_, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&user_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    let toggle_uri = format!("/manager/mailings/{}/toggle", mailing_id);
    let (status, body) = request(&app.router, "POST", &toggle_uri, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    let (_, body) = request(&app.router, "POST", &toggle_uri, Some(&manager_token), None).await;
    assert_eq!(body["status"], "created");

    // Deactivate the member: their token stops working immediately
    let user_toggle = format!("/manager/users/{}/toggle", user_id);
    let (status, body) = request(&app.router, "POST", &user_toggle, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = request(&app.router, "GET", "/clients", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "user@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Managers cannot lock themselves out
    let manager_id = manager_token.split(':').next().expect("manager id");
    let self_toggle = format!("/manager/users/{}/toggle", manager_id);
    let (status, _) = request(&app.router, "POST", &self_toggle, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mailing_close_and_attempt_log() {
    let app = test_app().await;
    let (_, owner_token) = seed_user(&app.pool, "owner@example.com", Role::Member, true).await;

    let (_, message) = request(
        &app.router,
        "POST",
        "/messages",
        Some(&owner_token),
        Some(json!({"subject": "S", "body": "B"})),
    )
    .await;
    let (_, mailing) = request(
        &app.router,
        "POST",
        "/mailings",
        Some(&owner_token),
        Some(json!({
            "start_at": Utc::now().to_rfc3339(),
            "periodicity": "daily",
            "message_id": message["id"],
            "client_ids": []
        })),
    )
    .await;
    let mailing_id = mailing["id"].as_i64().expect("mailing id");

    // One dispatch pass leaves one attempt in the log
    app.dispatcher.run().await.expect("dispatch");
    let attempts_uri = format!("/mailings/{}/attempts", mailing_id);
    let (status, attempts) = request(&app.router, "GET", &attempts_uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempts.as_array().map(Vec::len), Some(1));

    let close_uri = format!("/mailings/{}/close", mailing_id);
    let (status, body) = request(&app.router, "POST", &close_uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");

    // Closed mailings are out of dispatch's reach
    let summary = app.dispatcher.run().await.expect("dispatch");
    assert_eq!(summary.sent + summary.skipped + summary.failed, 0);
}

#[tokio::test]
async fn dispatch_endpoint_is_manager_only() {
    let app = test_app().await;
    let (_, user_token) = seed_user(&app.pool, "user@example.com", Role::Member, true).await;
    let (_, manager_token) = seed_user(&app.pool, "boss@example.com", Role::Manager, true).await;

    let (status, _) = request(&app.router, "POST", "/dispatch/run", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app.router, "POST", "/dispatch/run", Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn send_test_email_goes_to_caller() {
    let app = test_app().await;
    let (_, token) = seed_user(&app.pool, "me@example.com", Role::Member, true).await;

    let (status, body) = request(&app.router, "POST", "/send-test-email", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let mail = app.mailer.last_sent().expect("test mail");
    assert_eq!(mail.recipients, vec!["me@example.com".to_string()]);
}

#[tokio::test]
async fn blog_cache_serves_stale_views_until_write() {
    let app = test_app().await;
    let (_, author_token) = seed_user(&app.pool, "author@example.com", Role::Member, true).await;

    let (status, post) = request(
        &app.router,
        "POST",
        "/blog",
        Some(&author_token),
        Some(json!({"title": "Hello", "content": "World"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_i64().expect("post id");

    // Unpublished: absent from the public list
    let (status, list) = request(&app.router, "GET", "/blog", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    let publish_uri = format!("/blog/{}/publish", post_id);
    let (status, _) = request(&app.router, "POST", &publish_uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Publishing cleared the cached empty list
    let (_, list) = request(&app.router, "GET", "/blog", None, None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    // First detail read counts a view; the second is a cache hit and does not
    let detail_uri = format!("/blog/{}", post_id);
    let (_, post) = request(&app.router, "GET", &detail_uri, None, None).await;
    assert_eq!(post["views"], 1);
    let (_, post) = request(&app.router, "GET", &detail_uri, None, None).await;
    assert_eq!(post["views"], 1);
    let views = sqlx::query_scalar::<_, i64>("SELECT views FROM blog_posts WHERE id = ?")
        .bind(post_id)
        .fetch_one(&app.pool)
        .await
        .expect("views");
    assert_eq!(views, 1);

    // A write invalidates; the next read hits the store and counts again
    let (status, _) = request(
        &app.router,
        "PUT",
        &detail_uri,
        Some(&author_token),
        Some(json!({"title": "Hello 2", "content": "World"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, post) = request(&app.router, "GET", &detail_uri, None, None).await;
    assert_eq!(post["title"], "Hello 2");
    assert_eq!(post["views"], 2);
}
