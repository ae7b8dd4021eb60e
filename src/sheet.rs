use anyhow::{anyhow, Context};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::board::{DirectoryFetcher, UnlockPersister, UnlockRequest};
use crate::config::BoardConfig;
use crate::session::Directory;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnlockBody<'a> {
    action: &'static str,
    tab: &'a str,
    row_index: usize,
    mission_index: usize,
}

/// Talks to the sheet web app: GET returns every tab, POST flips one mission.
pub struct HttpSheetClient {
    client: reqwest::blocking::Client,
    json_url: String,
    update_url: String,
}

impl HttpSheetClient {
    pub fn from_config(config: &BoardConfig) -> anyhow::Result<HttpSheetClient> {
        let json_url = config
            .sheet_json_url
            .clone()
            .ok_or_else(|| anyhow!("config has no sheetJsonUrl"))?;
        let update_url = config
            .sheet_update_url
            .clone()
            .ok_or_else(|| anyhow!("config has no sheetUpdateUrl"))?;

        // No timeout unless configured; the transport layer decides when to give up.
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpSheetClient {
            client,
            json_url,
            update_url,
        })
    }
}

impl DirectoryFetcher for HttpSheetClient {
    fn fetch_directory(&self) -> anyhow::Result<Directory> {
        debug!(url = %self.json_url, "fetching directory");
        let resp = self
            .client
            .get(&self.json_url)
            .send()
            .with_context(|| format!("GET {} failed", self.json_url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {} returned {}", self.json_url, status));
        }
        resp.json::<Directory>()
            .context("sheet data is not a { tabs: [...] } document")
    }
}

impl UnlockPersister for HttpSheetClient {
    fn persist_unlock(&self, req: &UnlockRequest) -> anyhow::Result<()> {
        let body = UnlockBody {
            action: "unlock",
            tab: &req.tab,
            row_index: req.row_index,
            mission_index: req.mission_index,
        };
        debug!(
            url = %self.update_url,
            tab = %req.tab,
            row = req.row_index,
            mission = req.mission_index,
            "posting unlock"
        );
        let resp = self
            .client
            .post(&self.update_url)
            .json(&body)
            .send()
            .with_context(|| format!("POST {} failed", self.update_url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("POST {} returned {}", self.update_url, status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unlock_body_matches_wire_shape() {
        let body = UnlockBody {
            action: "unlock",
            tab: "A",
            row_index: 0,
            mission_index: 1,
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({ "action": "unlock", "tab": "A", "rowIndex": 0, "missionIndex": 1 })
        );
    }

    #[test]
    fn requires_both_urls() {
        let cfg = BoardConfig::default();
        assert!(HttpSheetClient::from_config(&cfg).is_err());
    }
}
