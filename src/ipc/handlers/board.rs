use crate::ipc::error::{board_err, err, ok};
use crate::ipc::helpers::{board_mut, check_session, str_param, usize_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_tiles(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_session(board, req) {
        return resp;
    }
    if board.active().is_none() {
        return err(&req.id, "not_logged_in", "no student is logged in", None);
    }
    ok(
        &req.id,
        json!({ "welcome": board.welcome(), "tiles": board.tiles() }),
    )
}

fn handle_unlock_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_session(board, req) {
        return resp;
    }
    let Some(mission_index) = usize_param(req, "missionIndex") else {
        return err(&req.id, "bad_params", "missing params.missionIndex", None);
    };

    match board.open_unlock(mission_index) {
        Ok(modal) => ok(&req.id, json!({ "modal": modal })),
        Err(e) => board_err(&req.id, &e),
    }
}

fn handle_unlock_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_session(board, req) {
        return resp;
    }
    match board.cancel_unlock() {
        Ok(()) => ok(&req.id, json!({ "state": board.state().name() })),
        Err(e) => board_err(&req.id, &e),
    }
}

fn handle_unlock_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_session(board, req) {
        return resp;
    }
    // A missing code is the same as an empty modal input.
    let code = str_param(req, "code").unwrap_or("");

    match board.submit_code(code) {
        Ok(mission_index) => ok(
            &req.id,
            json!({
                "missionIndex": mission_index,
                "unlocked": true,
                "state": board.state().name(),
                "tiles": board.tiles(),
            }),
        ),
        Err(e) => board_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "board.tiles" => Some(handle_tiles(state, req)),
        "unlock.open" => Some(handle_unlock_open(state, req)),
        "unlock.cancel" => Some(handle_unlock_cancel(state, req)),
        "unlock.submit" => Some(handle_unlock_submit(state, req)),
        _ => None,
    }
}
