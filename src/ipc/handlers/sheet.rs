use crate::ipc::error::{err, ok};
use crate::ipc::helpers::str_param;
use crate::ipc::types::{AppState, Request};
use crate::session::Directory;
use anyhow::Context;
use serde_json::json;
use std::path::Path;
use tracing::info;

fn read_directory_file(path: &Path) -> anyhow::Result<Directory> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a {{ tabs: [...] }} document", path.to_string_lossy()))
}

fn handle_sheet_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let directory = if let Some(path) = str_param(req, "path") {
        match read_directory_file(Path::new(path)) {
            Ok(d) => d,
            Err(e) => return err(&req.id, "bad_params", format!("{e:#}"), None),
        }
    } else if req.params.get("tabs").is_some() {
        match serde_json::from_value::<Directory>(req.params.clone()) {
            Ok(d) => d,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        }
    } else {
        return err(&req.id, "bad_params", "missing params.tabs or params.path", None);
    };

    let summary = match store.import_directory(&directory) {
        Ok(s) => s,
        Err(e) => {
            return err(
                &req.id,
                "db_insert_failed",
                format!("{e:#}"),
                Some(json!({ "table": "tabs" })),
            )
        }
    };
    info!(
        tabs = summary.tab_count,
        rows = summary.row_count,
        "sheet imported into workspace"
    );

    // Rows may have moved under a logged-in student; start over.
    if let Some(board) = state.board.as_mut() {
        board.logout();
    }

    ok(
        &req.id,
        json!({ "tabCount": summary.tab_count, "rowCount": summary.row_count }),
    )
}

fn handle_sheet_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store.load_directory() {
        Ok(d) => ok(&req.id, json!(d)),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sheet.import" => Some(handle_sheet_import(state, req)),
        "sheet.export" => Some(handle_sheet_export(state, req)),
        _ => None,
    }
}
