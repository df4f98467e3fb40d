//! Extraction of notification actions from a delivered payload.

use serde_json::Value;

use crate::error::{ReceiverError, Result};

/// Top-level field holding the array of notifications
pub const NOTIFICATIONS_FIELD: &str = "Notifications";

/// Per-notification field naming the action
pub const ACTION_FIELD: &str = "Action";

/// Pull the action names out of `{"Notifications": [{"Action": "..."}, ...]}`.
///
/// Actions keep their array order. A missing or non-array `Notifications`
/// yields no actions, as do non-object entries and entries whose `Action` is
/// absent or not a string.
///
/// # Errors
///
/// Returns [`ReceiverError::InvalidPayload`] for a JSON `null`. Callers must
/// hand in a parsed body.
pub fn extract_actions(payload: &Value) -> Result<Vec<String>> {
    if payload.is_null() {
        return Err(ReceiverError::invalid_payload(
            "cannot extract actions from a null payload",
        ));
    }

    let Some(notifications) = payload.get(NOTIFICATIONS_FIELD).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let actions = notifications
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|notification| notification.get(ACTION_FIELD))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    Ok(actions)
}
