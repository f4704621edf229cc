/// Integration tests for the user and session endpoints
///
/// Run against an in-memory store; see `common::TestContext`.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(
            "POST",
            "/users",
            None,
            json!({ "name": " Ann ", "email": "A@X.com", "password": "mypw1234", "age": 30 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["name"], "Ann");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["age"], 30);

    // Secrets never leave the server
    let user = body["user"].as_object().unwrap();
    assert!(!user.contains_key("password_hash"));
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("tokens"));
    assert!(!user.contains_key("avatar"));
}

#[tokio::test]
async fn test_register_sends_welcome_email() {
    let ctx = TestContext::new();
    ctx.register("Ann", "a@x.com", "mypw1234").await;

    let mailer = ctx.mailer.clone();
    assert!(common::wait_for(|| !mailer.sent().is_empty(), 1000).await);

    let sent = ctx.mailer.sent();
    assert_eq!(sent[0].to, "a@x.com");
    assert_eq!(sent[0].subject, "Welcome to Task App");
    assert_eq!(sent[0].from, ctx.config.mail.from_address);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(
            "POST",
            "/users",
            None,
            json!({ "name": "", "email": "nope", "password": "Password99", "age": -3 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    for field in ["name", "email", "password", "age"] {
        assert!(fields.contains(&field), "missing {} in {:?}", field, fields);
    }
    assert_eq!(ctx.store.user_count().await, 0);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new();
    ctx.register("Ann", "a@x.com", "mypw1234").await;

    let (status, body) = ctx
        .json(
            "POST",
            "/users",
            None,
            json!({ "name": "Other", "email": "A@x.COM", "password": "otherpw1" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");
    assert_eq!(body["details"][0]["message"], "Email is already registered");
}

#[tokio::test]
async fn test_register_rejects_malformed_json() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = common::read_json(ctx.send(request).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("Ann", "a@x.com", "mypw1234").await;

    let (status_a, body_a) = ctx
        .json(
            "POST",
            "/users/login",
            None,
            json!({ "email": "a@x.com", "password": "wrongpw1" }),
        )
        .await;
    let (status_b, body_b) = ctx
        .json(
            "POST",
            "/users/login",
            None,
            json!({ "email": "nobody@x.com", "password": "mypw1234" }),
        )
        .await;

    assert_eq!(status_a, StatusCode::BAD_REQUEST);
    assert_eq!(status_b, StatusCode::BAD_REQUEST);
    assert_eq!(body_a, json!({ "error": "Unable to login" }));
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = TestContext::new();

    let (_, t1) = ctx.register("A", "a@x.com", "mypw1234").await;
    let t2 = ctx.login("a@x.com", "mypw1234").await;
    assert_ne!(t1, t2);

    // Both sessions are live
    for token in [&t1, &t2] {
        let (status, body) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@x.com");
    }

    // Logging out T1 leaves T2 alone
    let (status, _) = ctx.empty("POST", "/users/logout", Some(t1.as_str())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.empty("GET", "/users/me", Some(t1.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Please authenticate." }));

    let (status, _) = ctx.empty("GET", "/users/me", Some(t2.as_str())).await;
    assert_eq!(status, StatusCode::OK);

    // logoutAll ends the rest
    let t3 = ctx.login("a@x.com", "mypw1234").await;
    let (status, _) = ctx.empty("POST", "/users/logoutAll", Some(t2.as_str())).await;
    assert_eq!(status, StatusCode::OK);

    for token in [&t2, &t3] {
        let (status, _) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let ctx = TestContext::new();

    for (method, uri) in [
        ("GET", "/users/me"),
        ("PATCH", "/users/me"),
        ("DELETE", "/users/me"),
        ("POST", "/users/logout"),
        ("POST", "/users/logoutAll"),
        ("POST", "/users/me/avatar"),
        ("DELETE", "/users/me/avatar"),
    ] {
        let (status, body) = ctx.empty(method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "Please authenticate.");

        let (status, _) = ctx.empty(method, uri, Some("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_update_me() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;

    let (status, body) = ctx
        .json(
            "PATCH",
            "/users/me",
            Some(token.as_str()),
            json!({ "name": "Bea", "age": 41, "password": "newpw5678" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bea");
    assert_eq!(body["age"], 41);

    // The session survives a password change, and the new password works
    let (status, _) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    ctx.login("a@x.com", "newpw5678").await;
}

#[tokio::test]
async fn test_update_me_rejects_unknown_fields_without_mutation() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;

    let (status, body) = ctx
        .json(
            "PATCH",
            "/users/me",
            Some(token.as_str()),
            json!({ "name": "Mallory", "role": "admin" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid updates!" }));

    let (_, me) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
    assert_eq!(me["name"], "Ann");
}

#[tokio::test]
async fn test_update_me_rejects_clearing_required_fields() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;

    for field in ["name", "email", "password"] {
        let mut update = serde_json::Map::new();
        update.insert(field.to_string(), serde_json::Value::Null);

        let (status, body) = ctx
            .json("PATCH", "/users/me", Some(token.as_str()), update.into())
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "null {}", field);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["field"], field);
    }

    let (_, me) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
    assert_eq!(me["name"], "Ann");
    assert_eq!(me["email"], "a@x.com");
    ctx.login("a@x.com", "mypw1234").await;

    // A null age is ignored
    let (status, body) = ctx
        .json("PATCH", "/users/me", Some(token.as_str()), json!({ "age": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 0);
}

#[tokio::test]
async fn test_update_me_rejects_forbidden_password() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;

    let (status, body) = ctx
        .json(
            "PATCH",
            "/users/me",
            Some(token.as_str()),
            json!({ "password": "myPASSWORD1" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "password");
    ctx.login("a@x.com", "mypw1234").await;
}

#[tokio::test]
async fn test_delete_me() {
    let ctx = TestContext::new();
    let (user, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;
    let other = ctx.login("a@x.com", "mypw1234").await;

    let (status, body) = ctx.empty("DELETE", "/users/me", Some(token.as_str())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user["id"]);
    assert_eq!(ctx.store.user_count().await, 0);

    // Every session of the deleted user is gone
    for token in [&token, &other] {
        let (status, _) = ctx.empty("GET", "/users/me", Some(token.as_str())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let mailer = ctx.mailer.clone();
    assert!(
        common::wait_for(
            || mailer
                .sent()
                .iter()
                .any(|e| e.subject == "Account Successfully deleted"),
            1000
        )
        .await
    );
}

#[tokio::test]
async fn test_delete_me_removes_owned_tasks() {
    use taskapp_shared::models::task::NewTask;
    use taskapp_shared::store::UserStore;

    let ctx = TestContext::new();
    let (user, token) = ctx.register("Ann", "a@x.com", "mypw1234").await;
    let user_id = uuid::Uuid::parse_str(user["id"].as_str().unwrap()).unwrap();

    ctx.store
        .create_task(NewTask::open(user_id, "write report"))
        .await
        .unwrap();

    let (status, _) = ctx.empty("DELETE", "/users/me", Some(token.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.store.tasks_owned_by(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.empty("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
