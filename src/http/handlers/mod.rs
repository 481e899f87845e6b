pub mod attendance;
pub mod core;
pub mod roster;

use serde::de::DeserializeOwned;

use super::error::HandlerErr;
use super::types::Request;

/// `Ok(None)` for an empty or `null` body.
pub fn parse_body<T: DeserializeOwned>(req: &Request) -> Result<Option<T>, HandlerErr> {
    let raw = req.body.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| HandlerErr::bad_params(format!("invalid request body: {e}")))
}

pub fn require_body<T: DeserializeOwned>(req: &Request) -> Result<T, HandlerErr> {
    parse_body(req)?.ok_or_else(|| HandlerErr::bad_params("request body is required"))
}
