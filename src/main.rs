mod board;
mod config;
mod ipc;
mod logging;
mod session;
mod sheet;
mod store;

use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() {
    logging::setup_logging();

    let config = match config::BoardConfig::from_env() {
        Ok(Some(c)) => c,
        Ok(None) => config::BoardConfig::default(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "ignoring unreadable {}", config::CONFIG_ENV);
            config::BoardConfig::default()
        }
    };
    let mut state = ipc::AppState::new(config);
    if let Err(e) = ipc::rebuild_board(&mut state) {
        warn!(error = %format!("{e:#}"), "sheet source unavailable at startup");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "missionboardd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
