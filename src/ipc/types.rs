use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use crate::board::BoardController;
use crate::config::BoardConfig;
use crate::store::SheetStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: BoardConfig,
    pub workspace: Option<PathBuf>,
    pub store: Option<Rc<SheetStore>>,
    /// Present once a sheet source is known (a workspace or the configured URLs).
    pub board: Option<BoardController>,
}

impl AppState {
    pub fn new(config: BoardConfig) -> Self {
        AppState {
            config,
            workspace: None,
            store: None,
            board: None,
        }
    }
}
