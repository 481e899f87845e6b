use serde_json::json;

use crate::http::error::ok;
use crate::http::types::{AppState, Method, Request, Response};

fn handle_health(state: &AppState) -> Response {
    ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.to_string_lossy(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Response> {
    let segments = req.segments();
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();
    match (req.method, segs.as_slice()) {
        (Method::Get, ["api", "health"]) => Some(handle_health(state)),
        _ => None,
    }
}
