use serde_json::json;

use crate::board::BoardError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Board errors carry the student-facing notice as their message.
pub fn board_err(id: &str, e: &BoardError) -> serde_json::Value {
    let details = match e {
        BoardError::Transport { detail, .. } => Some(json!({ "detail": detail })),
        BoardError::MissionIndexOutOfRange(i) | BoardError::AlreadyUnlocked(i) => {
            Some(json!({ "missionIndex": i }))
        }
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
