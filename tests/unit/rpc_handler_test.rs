//! Unit tests for the JSON-RPC method handler.

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use syncmarks::app::App;
use syncmarks::config::Config;
use syncmarks::rpc_handler::handle_method;

fn setup() -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        data_dir: tmp.path().to_path_buf(),
        ..Config::default()
    };
    let app = App::new(config).unwrap();
    (Mutex::new(app), tmp)
}

async fn login(app: &Mutex<App>, user_id: &str) -> Value {
    handle_method(
        app,
        "auth.login",
        &json!({"user_id": user_id, "access_token": "tok-123"}),
    )
    .await
    .unwrap()
}

// ─── Dispatch ───

#[tokio::test]
async fn test_ping() {
    let (app, _tmp) = setup();
    let result = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(result["pong"], true);
}

#[tokio::test]
async fn test_unknown_method() {
    let (app, _tmp) = setup();
    let err = handle_method(&app, "bookmark.frobnicate", &json!({}))
        .await
        .unwrap_err();
    assert!(err.contains("unknown method"));
}

// ─── Auth ───

#[tokio::test]
async fn test_login_returns_identity() {
    let (app, _tmp) = setup();

    let result = handle_method(
        &app,
        "auth.login",
        &json!({"user_id": "alice", "email": "alice@example.com", "access_token": "tok"}),
    )
    .await
    .unwrap();

    assert_eq!(result["identity"]["user_id"], "alice");
    assert_eq!(result["identity"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_without_email() {
    let (app, _tmp) = setup();

    let result = login(&app, "alice").await;

    assert_eq!(result["identity"]["user_id"], "alice");
    assert_eq!(result["identity"]["email"], Value::Null);
}

#[tokio::test]
async fn test_login_requires_user_id() {
    let (app, _tmp) = setup();

    let err = handle_method(&app, "auth.login", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing user_id");

    let err = handle_method(&app, "auth.login", &json!({"user_id": "   "}))
        .await
        .unwrap_err();
    assert_eq!(err, "user_id must not be blank");
}

#[tokio::test]
async fn test_status_signed_out() {
    let (app, _tmp) = setup();

    let result = handle_method(&app, "auth.status", &json!({})).await.unwrap();

    assert_eq!(result["authenticated"], false);
    assert_eq!(result["identity"], Value::Null);
}

#[tokio::test]
async fn test_status_after_login() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let result = handle_method(&app, "auth.status", &json!({})).await.unwrap();

    assert_eq!(result["authenticated"], true);
    assert_eq!(result["identity"]["user_id"], "alice");
}

#[tokio::test]
async fn test_logout() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let result = handle_method(&app, "auth.logout", &json!({})).await.unwrap();
    assert_eq!(result["ok"], true);

    let status = handle_method(&app, "auth.status", &json!({})).await.unwrap();
    assert_eq!(status["authenticated"], false);
}

// ─── View ───

#[tokio::test]
async fn test_view_open_requires_auth() {
    let (app, _tmp) = setup();

    let err = handle_method(&app, "view.open", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, "Not authenticated");
}

#[tokio::test]
async fn test_view_open_returns_empty_live_list() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let result = handle_method(&app, "view.open", &json!({})).await.unwrap();

    assert_eq!(result["bookmarks"], json!([]));
    assert_eq!(result["subscription"], "active");
}

#[tokio::test]
async fn test_view_list_without_open_view() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let err = handle_method(&app, "view.list", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, "no open view");
}

#[tokio::test]
async fn test_view_close() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;
    handle_method(&app, "view.open", &json!({})).await.unwrap();

    let result = handle_method(&app, "view.close", &json!({})).await.unwrap();
    assert_eq!(result["ok"], true);

    let err = handle_method(&app, "view.list", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, "no open view");
}

#[tokio::test]
async fn test_login_as_other_user_closes_view() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;
    handle_method(&app, "view.open", &json!({})).await.unwrap();

    login(&app, "bob").await;

    let err = handle_method(&app, "view.list", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, "no open view");
}

#[tokio::test]
async fn test_relogin_as_same_user_keeps_view() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;
    handle_method(&app, "view.open", &json!({})).await.unwrap();

    login(&app, "alice").await;

    let result = handle_method(&app, "view.list", &json!({})).await.unwrap();
    assert_eq!(result["bookmarks"], json!([]));
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_add_requires_auth() {
    let (app, _tmp) = setup();

    let err = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "T", "url": "https://example.com"}),
    )
    .await
    .unwrap_err();

    assert_eq!(err, "Not authenticated");
}

#[tokio::test]
async fn test_add_validates_params() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let err = handle_method(&app, "bookmark.add", &json!({"url": "https://example.com"}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing title");

    let err = handle_method(&app, "bookmark.add", &json!({"title": "T"}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing url");

    let err = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "  ", "url": "https://example.com"}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, "title must not be blank");

    let err = handle_method(&app, "bookmark.add", &json!({"title": "T", "url": ""}))
        .await
        .unwrap_err();
    assert_eq!(err, "url must not be blank");
}

#[tokio::test]
async fn test_add_updates_open_view() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;
    handle_method(&app, "view.open", &json!({})).await.unwrap();

    let added = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "First", "url": "https://example.com/1"}),
    )
    .await
    .unwrap();
    assert_eq!(added["bookmark"]["title"], "First");
    assert_eq!(added["bookmark"]["owner_id"], "alice");

    handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Second", "url": "https://example.com/2"}),
    )
    .await
    .unwrap();

    // Local applies land immediately, newest first
    let list = handle_method(&app, "view.list", &json!({})).await.unwrap();
    let titles: Vec<&str> = list["bookmarks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_add_without_view_persists() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Kept", "url": "https://example.com/kept"}),
    )
    .await
    .unwrap();

    let result = handle_method(&app, "view.open", &json!({})).await.unwrap();
    assert_eq!(result["bookmarks"].as_array().unwrap().len(), 1);
    assert_eq!(result["bookmarks"][0]["title"], "Kept");
}

#[tokio::test]
async fn test_delete_removes_from_view() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;
    handle_method(&app, "view.open", &json!({})).await.unwrap();
    let added = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Doomed", "url": "https://example.com/doomed"}),
    )
    .await
    .unwrap();
    let id = added["bookmark"]["id"].as_str().unwrap().to_string();

    let result = handle_method(&app, "bookmark.delete", &json!({"id": id}))
        .await
        .unwrap();
    assert_eq!(result["ok"], true);

    let list = handle_method(&app, "view.list", &json!({})).await.unwrap();
    assert_eq!(list["bookmarks"], json!([]));

    let err = handle_method(&app, "bookmark.delete", &json!({"id": id}))
        .await
        .unwrap_err();
    assert!(err.contains("not found"));
}

#[tokio::test]
async fn test_delete_requires_id() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let err = handle_method(&app, "bookmark.delete", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, "missing id");
}

// ─── Sync ───

#[tokio::test]
async fn test_sync_status_follows_view_lifecycle() {
    let (app, _tmp) = setup();
    login(&app, "alice").await;

    let result = handle_method(&app, "sync.status", &json!({})).await.unwrap();
    assert_eq!(result["subscription"], "unsubscribed");
    assert_eq!(result["backend"], "local");

    handle_method(&app, "view.open", &json!({})).await.unwrap();

    let result = handle_method(&app, "sync.status", &json!({})).await.unwrap();
    assert_eq!(result["subscription"], "active");

    handle_method(&app, "view.close", &json!({})).await.unwrap();

    let result = handle_method(&app, "sync.status", &json!({})).await.unwrap();
    assert_eq!(result["subscription"], "unsubscribed");
}
