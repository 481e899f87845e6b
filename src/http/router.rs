use super::error::err;
use super::handlers;
use super::types::{AppState, Request, Response};

pub fn handle_request(state: &mut AppState, req: Request) -> Response {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::attendance::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::roster::try_handle(state, &req) {
        return resp;
    }

    err(
        404,
        "not_implemented",
        format!("unknown route: {} {}", req.method, req.path),
        None,
    )
}
