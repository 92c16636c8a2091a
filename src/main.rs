//! syncmarks RPC server — JSON-RPC over stdin/stdout for shell integration.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"event":"change", "change":{...}} for feed events on the open view.
//!
//! Logs go to stderr; stdout carries protocol lines only.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use syncmarks::app::App;
use syncmarks::config::Config;
use syncmarks::rpc_handler::handle_method;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit_line(value: &Value) {
    println!("{}", value);
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let backend = config.backend;

    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize syncmarks");
            std::process::exit(1);
        }
    };
    // Feed events on the open view are pushed to the client as they land
    app.set_event_sink(Arc::new(|event| {
        emit_line(&json!({"event": "change", "change": event}));
    }));
    let app = Mutex::new(app);

    info!(backend = %backend, version = env!("CARGO_PKG_VERSION"), "syncmarks started");

    // Signal ready
    emit_line(&json!({
        "event": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": backend.to_string(),
    }));

    // Rate limiting: max 200 RPC requests per second
    let mut rate_limiter = RateLimiter::new(200);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit_line(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            emit_line(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let result = handle_method(&app, method, &params).await;

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit_line(&response);
    }

    app.lock().await.shutdown();
}
