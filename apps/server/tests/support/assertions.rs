use axum::http::StatusCode;
use serde_json::Value;

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected status {expected}, got {actual}"
    );
}

/// Assert that a view entry carries an `error` and nothing else.
pub fn assert_view_error(response: &Value, view_id: &str) {
    let view = &response[view_id];
    assert!(
        view.get("error").is_some(),
        "expected view {view_id} to be an error, got {view}"
    );
    assert_eq!(
        view.as_object().map(|o| o.len()),
        Some(1),
        "error entry for {view_id} should carry no result"
    );
}

/// `(key, count)` pairs of a counts view.
pub fn counts(response: &Value, view_id: &str) -> Vec<(String, u64)> {
    response[view_id]["counts"]
        .as_array()
        .unwrap_or_else(|| panic!("view {view_id} has no counts: {response}"))
        .iter()
        .map(|entry| {
            (
                entry[0].as_str().unwrap_or_default().to_string(),
                entry[1].as_u64().unwrap_or_default(),
            )
        })
        .collect()
}
