use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BoardConfig;
use crate::session::{codes_match, resolve, Directory, Session, MISSION_COUNT};

pub trait DirectoryFetcher {
    fn fetch_directory(&self) -> anyhow::Result<Directory>;
}

pub trait UnlockPersister {
    fn persist_unlock(&self, req: &UnlockRequest) -> anyhow::Result<()>;
}

impl<T: DirectoryFetcher + ?Sized> DirectoryFetcher for Rc<T> {
    fn fetch_directory(&self) -> anyhow::Result<Directory> {
        (**self).fetch_directory()
    }
}

impl<T: UnlockPersister + ?Sized> UnlockPersister for Rc<T> {
    fn persist_unlock(&self, req: &UnlockRequest) -> anyhow::Result<()> {
        (**self).persist_unlock(req)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    pub tab: String,
    pub row_index: usize,
    pub mission_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    Fetch,
    Persist,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportOp::Fetch => f.write_str("Unable to load data. Please try again later."),
            TransportOp::Persist => f.write_str("Error updating. Please try again."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Please enter both name and login code.")]
    EmptyCredentials,
    #[error("Please enter a code.")]
    EmptyCode,
    #[error("Incorrect code. Please try again.")]
    IncorrectCode,
}

/// Every variant leaves the board in its last stable state; the message is
/// what the student sees.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("No matching student found. Check your name and login code.")]
    NotFound,
    #[error("{op}")]
    Transport { op: TransportOp, detail: String },
    #[error("{0}")]
    Validation(ValidationFailure),
    #[error("no student is logged in")]
    NotLoggedIn,
    #[error("no unlock is pending")]
    NoPendingUnlock,
    #[error("mission index {0} is out of range")]
    MissionIndexOutOfRange(usize),
    #[error("mission {0} is already unlocked")]
    AlreadyUnlocked(usize),
}

impl BoardError {
    pub fn code(&self) -> &'static str {
        match self {
            BoardError::NotFound => "not_found",
            BoardError::Transport {
                op: TransportOp::Fetch,
                ..
            } => "fetch_failed",
            BoardError::Transport {
                op: TransportOp::Persist,
                ..
            } => "persist_failed",
            BoardError::Validation(ValidationFailure::EmptyCredentials) => "empty_credentials",
            BoardError::Validation(ValidationFailure::EmptyCode) => "empty_code",
            BoardError::Validation(ValidationFailure::IncorrectCode) => "incorrect_code",
            BoardError::NotLoggedIn => "not_logged_in",
            BoardError::NoPendingUnlock => "no_pending_unlock",
            BoardError::MissionIndexOutOfRange(_) => "bad_mission_index",
            BoardError::AlreadyUnlocked(_) => "already_unlocked",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub session: Session,
}

#[derive(Debug, Clone)]
pub enum BoardState {
    LoggedOut,
    LoggedIn(ActiveSession),
    UnlockPending {
        active: ActiveSession,
        mission_index: usize,
    },
}

impl BoardState {
    pub fn name(&self) -> &'static str {
        match self {
            BoardState::LoggedOut => "loggedOut",
            BoardState::LoggedIn(_) => "loggedIn",
            BoardState::UnlockPending { .. } => "unlockPending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub index: usize,
    pub label: String,
    pub unlocked: bool,
    pub asset: String,
    /// Only locked tiles open the code-entry modal.
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalView {
    pub mission_index: usize,
    pub label: String,
    pub title: String,
}

pub struct BoardController {
    config: BoardConfig,
    fetcher: Box<dyn DirectoryFetcher>,
    persister: Box<dyn UnlockPersister>,
    state: BoardState,
}

impl BoardController {
    pub fn new(
        config: BoardConfig,
        fetcher: Box<dyn DirectoryFetcher>,
        persister: Box<dyn UnlockPersister>,
    ) -> Self {
        BoardController {
            config,
            fetcher,
            persister,
            state: BoardState::LoggedOut,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            BoardState::LoggedOut => None,
            BoardState::LoggedIn(active) => Some(active),
            BoardState::UnlockPending { active, .. } => Some(active),
        }
    }

    pub fn welcome(&self) -> Option<String> {
        self.active().map(|a| format!("Welcome, {}", a.session.name))
    }

    /// Fetches the directory and resolves the student. On any failure the
    /// current state is kept as it was.
    pub fn login(&mut self, name: &str, code: &str) -> Result<&ActiveSession, BoardError> {
        if name.trim().is_empty() || code.trim().is_empty() {
            return Err(BoardError::Validation(ValidationFailure::EmptyCredentials));
        }

        let directory = self.fetcher.fetch_directory().map_err(|e| {
            warn!(error = %format!("{e:#}"), "directory fetch failed");
            BoardError::Transport {
                op: TransportOp::Fetch,
                detail: format!("{e:#}"),
            }
        })?;
        debug!(
            tabs = directory.tabs.len(),
            rows = directory.row_count(),
            "directory fetched"
        );

        let Some(session) = resolve(&directory, name, code) else {
            info!("login matched no student");
            return Err(BoardError::NotFound);
        };

        let active = ActiveSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            session,
        };
        info!(
            session_id = %active.id,
            student = %active.session.name,
            tab = %active.session.tab_name,
            row = active.session.row_index,
            unlocked = active.session.unlocked_count(),
            "student logged in"
        );
        self.state = BoardState::LoggedIn(active);
        self.active().ok_or(BoardError::NotLoggedIn)
    }

    pub fn logout(&mut self) {
        if let Some(a) = self.active() {
            info!(session_id = %a.id, "student logged out");
        }
        self.state = BoardState::LoggedOut;
    }

    /// Opens the code-entry modal for a locked mission. Opening while another
    /// modal is pending re-targets it.
    pub fn open_unlock(&mut self, mission_index: usize) -> Result<ModalView, BoardError> {
        if mission_index >= MISSION_COUNT {
            return Err(BoardError::MissionIndexOutOfRange(mission_index));
        }
        match self.active() {
            None => return Err(BoardError::NotLoggedIn),
            Some(a) if a.session.mission_unlocked[mission_index] => {
                return Err(BoardError::AlreadyUnlocked(mission_index));
            }
            Some(_) => {}
        }

        let active = match std::mem::replace(&mut self.state, BoardState::LoggedOut) {
            BoardState::LoggedIn(active) | BoardState::UnlockPending { active, .. } => active,
            BoardState::LoggedOut => return Err(BoardError::NotLoggedIn),
        };
        self.state = BoardState::UnlockPending {
            active,
            mission_index,
        };
        Ok(self.modal_view(mission_index))
    }

    pub fn modal(&self) -> Option<ModalView> {
        match &self.state {
            BoardState::UnlockPending { mission_index, .. } => {
                Some(self.modal_view(*mission_index))
            }
            _ => None,
        }
    }

    fn modal_view(&self, mission_index: usize) -> ModalView {
        let label = self.config.mission_label(mission_index).to_string();
        ModalView {
            mission_index,
            title: format!("Enter unlock code for: {label}"),
            label,
        }
    }

    pub fn cancel_unlock(&mut self) -> Result<(), BoardError> {
        match std::mem::replace(&mut self.state, BoardState::LoggedOut) {
            BoardState::LoggedOut => Err(BoardError::NotLoggedIn),
            BoardState::LoggedIn(active) | BoardState::UnlockPending { active, .. } => {
                self.state = BoardState::LoggedIn(active);
                Ok(())
            }
        }
    }

    /// Checks the code for the pending mission and persists the unlock.
    /// The local flag flips only after the persist call succeeds.
    pub fn submit_code(&mut self, text: &str) -> Result<usize, BoardError> {
        let (active, mission_index) = match &mut self.state {
            BoardState::UnlockPending {
                active,
                mission_index,
            } => (active, *mission_index),
            BoardState::LoggedIn(_) => return Err(BoardError::NoPendingUnlock),
            BoardState::LoggedOut => return Err(BoardError::NotLoggedIn),
        };

        if text.trim().is_empty() {
            return Err(BoardError::Validation(ValidationFailure::EmptyCode));
        }
        if !codes_match(text, &active.session.mission_code[mission_index]) {
            debug!(session_id = %active.id, mission = mission_index, "incorrect unlock code");
            return Err(BoardError::Validation(ValidationFailure::IncorrectCode));
        }

        let req = UnlockRequest {
            tab: active.session.tab_name.clone(),
            row_index: active.session.row_index,
            mission_index,
        };
        if let Err(e) = self.persister.persist_unlock(&req) {
            warn!(
                session_id = %active.id,
                mission = mission_index,
                error = %format!("{e:#}"),
                "unlock persist failed"
            );
            return Err(BoardError::Transport {
                op: TransportOp::Persist,
                detail: format!("{e:#}"),
            });
        }

        active.session.mission_unlocked[mission_index] = true;
        info!(session_id = %active.id, mission = mission_index, "mission unlocked");

        if let BoardState::UnlockPending { active, .. } =
            std::mem::replace(&mut self.state, BoardState::LoggedOut)
        {
            self.state = BoardState::LoggedIn(active);
        }
        Ok(mission_index)
    }

    /// Render-ready tiles for the logged-in student, one per configured mission.
    pub fn tiles(&self) -> Vec<Tile> {
        let Some(active) = self.active() else {
            return Vec::new();
        };
        self.config
            .missions
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let unlocked = active.session.mission_unlocked[index];
                Tile {
                    index,
                    label: label.clone(),
                    unlocked,
                    asset: self.config.asset_path(index, unlocked),
                    clickable: !unlocked,
                }
            })
            .collect()
    }
}
