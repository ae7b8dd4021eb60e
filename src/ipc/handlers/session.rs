use crate::board::BoardState;
use crate::ipc::error::{board_err, err, ok};
use crate::ipc::helpers::{board_mut, check_session, str_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let (Some(name), Some(code)) = (str_param(req, "name"), str_param(req, "code")) else {
        return err(&req.id, "bad_params", "missing params.name or params.code", None);
    };

    let mut result = match board.login(name, code) {
        Ok(active) => json!({
            "sessionId": active.id.to_string(),
            "name": active.session.name,
            "tab": active.session.tab_name,
            "rowIndex": active.session.row_index,
            "startedAt": active.started_at.to_rfc3339(),
        }),
        Err(e) => return board_err(&req.id, &e),
    };

    result["welcome"] = json!(board.welcome());
    result["tiles"] = json!(board.tiles());
    ok(&req.id, result)
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(board) = state.board.as_mut() {
        if let Err(resp) = check_session(board, req) {
            return resp;
        }
        board.logout();
    }
    ok(&req.id, json!({ "loggedOut": true }))
}

/// Snapshot of the board for the UI. Unlock codes never leave the sidecar.
fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(board) = state.board.as_ref() else {
        return ok(&req.id, json!({ "state": "loggedOut" }));
    };

    let mut result = json!({ "state": board.state().name() });
    if let Some(active) = board.active() {
        result["sessionId"] = json!(active.id.to_string());
        result["name"] = json!(active.session.name);
        result["tab"] = json!(active.session.tab_name);
        result["rowIndex"] = json!(active.session.row_index);
        result["startedAt"] = json!(active.started_at.to_rfc3339());
        result["welcome"] = json!(board.welcome());
        result["missionUnlocked"] = json!(active.session.mission_unlocked);
        result["unlockedCount"] = json!(active.session.unlocked_count());
    }
    if let BoardState::UnlockPending { .. } = board.state() {
        result["modal"] = json!(board.modal());
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.get" => Some(handle_get(state, req)),
        _ => None,
    }
}
