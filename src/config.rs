use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::session::MISSION_COUNT;

pub const CONFIG_ENV: &str = "MISSIONBOARD_CONFIG";
const DEFAULT_ASSETS_BASE: &str = "./assets";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    missions: Option<Vec<String>>,
    #[serde(default)]
    sheet_json_url: Option<String>,
    #[serde(default)]
    sheet_update_url: Option<String>,
    #[serde(default)]
    assets_base: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub missions: Vec<String>,
    pub sheet_json_url: Option<String>,
    pub sheet_update_url: Option<String>,
    pub assets_base: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            missions: default_missions(),
            sheet_json_url: None,
            sheet_update_url: None,
            assets_base: DEFAULT_ASSETS_BASE.to_string(),
            request_timeout_secs: None,
        }
    }
}

fn default_missions() -> Vec<String> {
    (1..=MISSION_COUNT).map(|n| format!("Mission {n}")).collect()
}

impl BoardConfig {
    pub fn from_json(value: serde_json::Value) -> anyhow::Result<BoardConfig> {
        let raw: RawConfig = serde_json::from_value(value).context("invalid board config")?;

        let missions = match raw.missions {
            Some(m) => m,
            None => default_missions(),
        };
        if missions.len() != MISSION_COUNT {
            return Err(anyhow!(
                "board config must list exactly {} missions, got {}",
                MISSION_COUNT,
                missions.len()
            ));
        }

        let sheet_json_url = raw
            .sheet_json_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        // One web app usually serves both the GET and the POST.
        let sheet_update_url = raw
            .sheet_update_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| sheet_json_url.clone());

        let assets_base = raw
            .assets_base
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ASSETS_BASE.to_string());

        Ok(BoardConfig {
            missions,
            sheet_json_url,
            sheet_update_url,
            assets_base,
            request_timeout_secs: raw.request_timeout_secs,
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<BoardConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("config {} is invalid JSON", path.to_string_lossy()))?;
        Self::from_json(value)
    }

    /// Reads the config named by `MISSIONBOARD_CONFIG`, if the variable is set.
    pub fn from_env() -> anyhow::Result<Option<BoardConfig>> {
        match std::env::var_os(CONFIG_ENV) {
            Some(p) if !p.is_empty() => Self::load(Path::new(&p)).map(Some),
            _ => Ok(None),
        }
    }

    pub fn has_remote_sheet(&self) -> bool {
        self.sheet_json_url.is_some() && self.sheet_update_url.is_some()
    }

    pub fn mission_label(&self, index: usize) -> &str {
        self.missions.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// Asset path for a mission tile; file names use the 1-based mission number.
    pub fn asset_path(&self, index: usize, unlocked: bool) -> String {
        let state = if unlocked { "unlocked" } else { "locked" };
        format!("{}/mission{}_{}.png", self.assets_base, index + 1, state)
    }
}
