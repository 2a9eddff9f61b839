//! Shared helpers for credential generation and response inspection.

use serde_json::Value;
use uuid::Uuid;

/// Random email and password for a test identity.
///
/// The email local part is `<label>-<uuid>` so parallel runs never collide.
pub fn generate_credentials(label: &str, domain: &str) -> (String, String) {
    let email = format!("{}-{}@{}", label, Uuid::new_v4(), domain);
    let password = format!("Pwd-{}", Uuid::new_v4());
    (email, password)
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Statuses that mean the data API refused the request outright.
pub fn is_denied(status: u16) -> bool {
    matches!(status, 401 | 403 | 404)
}

/// Extract a human-readable message from an auth API error body.
///
/// Tries `msg`, `error_description`, `message` then `error`, falling back
/// to the raw text.
pub fn extract_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|json| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(Value::as_str))
        })
        .map(String::from)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Render a row id for a PostgREST `eq.` filter. Ids may be uuids or integers.
pub fn filter_value(id: &Value) -> String {
    match id {
        Value::String(s) => urlencoding::encode(s).into_owned(),
        other => other.to_string(),
    }
}

/// Rows of a list response. Anything other than a JSON array has no rows.
pub fn rows(json: &Value) -> &[Value] {
    json.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Id of the first returned row, as produced by `Prefer: return=representation`.
pub fn first_row_id(json: &Value) -> Option<Value> {
    rows(json)
        .first()
        .and_then(|row| row.get("id"))
        .filter(|id| !id.is_null())
        .cloned()
}
