use std::io::Read;
use std::time::Instant;

use tracing::{info, warn};

use super::error::err;
use super::router::handle_request;
use super::types::{AppState, Method, Request};

fn map_method(method: &tiny_http::Method) -> Method {
    match method {
        tiny_http::Method::Get => Method::Get,
        tiny_http::Method::Post => Method::Post,
        _ => Method::Other,
    }
}

/// Runs one HTTP exchange to completion against the shared state.
pub fn serve(state: &mut AppState, mut request: tiny_http::Request) {
    let started = Instant::now();
    let method = map_method(request.method());
    let path = request.url().to_string();

    let mut body = String::new();
    let response = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => handle_request(
            state,
            Request {
                method,
                path: path.clone(),
                body,
            },
        ),
        Err(e) => err(400, "bad_body", format!("failed to read request body: {e}"), None),
    };

    let status = response.status;
    let payload =
        serde_json::to_string(&response.body).unwrap_or_else(|_| "{\"error\":{}}".to_string());
    let mut http_response = tiny_http::Response::from_string(payload).with_status_code(status);
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        http_response = http_response.with_header(header);
    }
    if let Err(e) = request.respond(http_response) {
        warn!(error = %e, %path, "failed to write response");
    }

    info!(
        %method,
        %path,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
}
