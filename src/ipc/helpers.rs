use std::rc::Rc;

use tracing::info;

use crate::board::BoardController;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::sheet::HttpSheetClient;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn usize_param(req: &Request, key: &str) -> Option<usize> {
    req.params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
}

/// Rebuilds the board from the current source. A selected workspace wins over
/// the configured URLs. Any live session is dropped.
pub fn rebuild_board(state: &mut AppState) -> anyhow::Result<()> {
    let board = if let Some(store) = state.store.as_ref() {
        info!(source = "workspace", "board source selected");
        BoardController::new(
            state.config.clone(),
            Box::new(Rc::clone(store)),
            Box::new(Rc::clone(store)),
        )
    } else if state.config.has_remote_sheet() {
        let client = Rc::new(HttpSheetClient::from_config(&state.config)?);
        info!(source = "http", "board source selected");
        BoardController::new(
            state.config.clone(),
            Box::new(Rc::clone(&client)),
            Box::new(client),
        )
    } else {
        state.board = None;
        return Ok(());
    };

    state.board = Some(board);
    Ok(())
}

pub fn source_name(state: &AppState) -> Option<&'static str> {
    state.board.as_ref()?;
    if state.store.is_some() {
        Some("workspace")
    } else {
        Some("http")
    }
}

/// Borrows the board, or builds the `no_source` error response.
pub fn board_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut BoardController, serde_json::Value> {
    state.board.as_mut().ok_or_else(|| {
        err(
            &req.id,
            "no_source",
            "select a workspace or load a config with sheet URLs first",
            None,
        )
    })
}

/// Requests may pin the session they were issued for; a mismatch means the
/// UI is acting on a session that has since ended.
pub fn check_session(board: &BoardController, req: &Request) -> Result<(), serde_json::Value> {
    let Some(wanted) = str_param(req, "sessionId") else {
        return Ok(());
    };
    match board.active() {
        Some(a) if a.id.to_string() == wanted => Ok(()),
        _ => Err(err(
            &req.id,
            "stale_session",
            "this session has ended; log in again",
            Some(serde_json::json!({ "sessionId": wanted })),
        )),
    }
}
