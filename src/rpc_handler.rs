//! RPC method handler for the syncmarks JSON-RPC protocol.
//!
//! Extracted from `main.rs` so it can be unit-tested independently.
//! `handle_method` dispatches method calls to the [`App`] struct.
//!
//! Auth absence surfaces as the literal "Not authenticated" message so a
//! client can route it to its sign-in flow; store failures keep their own
//! messages and leave the caller's input untouched.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::auth::session::SessionProviderTrait;
use crate::types::bookmark::Bookmark;
use crate::types::identity::Identity;

fn bookmark_json(bookmark: &Bookmark) -> Value {
    json!({
        "id": bookmark.id,
        "owner_id": bookmark.owner_id,
        "url": bookmark.url,
        "title": bookmark.title,
        "created_at": bookmark.created_at,
    })
}

fn identity_json(identity: &Identity) -> Value {
    json!({"user_id": identity.user_id, "email": identity.email})
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// The lock is a tokio mutex because store calls are awaited while holding it.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Auth ───
        "auth.login" => {
            let user_id = params.get("user_id").and_then(|v| v.as_str()).ok_or("missing user_id")?;
            if user_id.trim().is_empty() {
                return Err("user_id must not be blank".to_string());
            }
            let email = params.get("email").and_then(|v| v.as_str());
            let access_token = params.get("access_token").and_then(|v| v.as_str()).unwrap_or("");
            let mut a = app.lock().await;
            if a.view_owner() != Some(user_id) {
                a.close_view();
            }
            let identity = a
                .session
                .sign_in(user_id, email, access_token)
                .map_err(|e| e.to_string())?;
            Ok(json!({"identity": identity_json(&identity)}))
        }
        "auth.logout" => {
            let mut a = app.lock().await;
            a.close_view();
            a.session.sign_out().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "auth.status" => {
            let a = app.lock().await;
            let identity = a.session.current_identity().map_err(|e| e.to_string())?;
            Ok(json!({
                "authenticated": identity.is_some(),
                "identity": identity.as_ref().map(identity_json),
            }))
        }

        // ─── View ───
        "view.open" => {
            let mut a = app.lock().await;
            let identity = a.session.require_identity().map_err(|e| e.to_string())?;
            let records = a.open_view(&identity).await;
            let arr: Vec<Value> = records.iter().map(bookmark_json).collect();
            Ok(json!({
                "bookmarks": arr,
                "subscription": a.subscription_state().to_string(),
            }))
        }
        "view.list" => {
            let a = app.lock().await;
            let records = a.view_records().ok_or("no open view")?;
            let arr: Vec<Value> = records.iter().map(bookmark_json).collect();
            Ok(json!({"bookmarks": arr}))
        }
        "view.close" => {
            let mut a = app.lock().await;
            a.close_view();
            Ok(json!({"ok": true}))
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let title = params.get("title").and_then(|v| v.as_str()).ok_or("missing title")?;
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            if title.trim().is_empty() {
                return Err("title must not be blank".to_string());
            }
            if url.trim().is_empty() {
                return Err("url must not be blank".to_string());
            }
            let a = app.lock().await;
            let identity = a.session.require_identity().map_err(|e| e.to_string())?;
            let record = a
                .add_bookmark(&identity, title, url)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"bookmark": bookmark_json(&record)}))
        }
        "bookmark.delete" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let a = app.lock().await;
            let identity = a.session.require_identity().map_err(|e| e.to_string())?;
            a.delete_bookmark(&identity, id)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Sync ───
        "sync.status" => {
            let a = app.lock().await;
            Ok(json!({
                "subscription": a.subscription_state().to_string(),
                "backend": a.config.backend.to_string(),
            }))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
