use crate::config::BoardConfig;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{rebuild_board, source_name, str_param};
use crate::ipc::types::{AppState, Request};
use crate::session::MISSION_COUNT;
use crate::store;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "missionCount": MISSION_COUNT,
            "source": source_name(state),
            "state": state.board.as_ref().map(|b| b.state().name()),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let loaded = if let Some(path) = str_param(req, "path") {
        BoardConfig::load(Path::new(path))
    } else if let Some(inline) = req.params.get("config") {
        BoardConfig::from_json(inline.clone())
    } else {
        return err(&req.id, "bad_params", "missing params.path or params.config", None);
    };
    let config = match loaded {
        Ok(c) => c,
        Err(e) => return err(&req.id, "bad_config", format!("{e:#}"), None),
    };

    let previous = std::mem::replace(&mut state.config, config);
    if let Err(e) = rebuild_board(state) {
        state.config = previous;
        return err(&req.id, "bad_config", format!("{e:#}"), None);
    }

    ok(
        &req.id,
        json!({
            "missionCount": state.config.missions.len(),
            "sheetJsonUrl": state.config.sheet_json_url,
            "sheetUpdateUrl": state.config.sheet_update_url,
            "assetsBase": state.config.assets_base,
            "source": source_name(state),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = str_param(req, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match store::open_store(&path) {
        Ok(s) => {
            state.workspace = Some(path.clone());
            state.store = Some(Rc::new(s));
            if let Err(e) = rebuild_board(state) {
                return err(&req.id, "db_open_failed", format!("{e:#}"), None);
            }
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.load" => Some(handle_config_load(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
