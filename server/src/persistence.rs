use std::path::{Path, PathBuf};
use std::time::Duration;

use common::engine::SimulationSession;
use common::games::snake::GameSnapshot;
use common::{log, log_warn};

use crate::error::ServerError;

/// Keeps the latest snapshot in a JSON file.
#[derive(Clone, Debug)]
pub struct StateFileStore {
    path: PathBuf,
}

impl StateFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no state has been saved yet.
    pub async fn load(&self) -> Result<Option<GameSnapshot>, ServerError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.file_error(source)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Written to a sibling temp file, then renamed over the target.
    pub async fn save(&self, snapshot: &GameSnapshot) -> Result<(), ServerError> {
        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|source| self.file_error(source))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| self.file_error(source))
    }

    /// Snapshot under the session lock, write after it is released.
    pub async fn save_session(&self, session: &SimulationSession) -> Result<(), ServerError> {
        let snapshot = session.snapshot().await;
        self.save(&snapshot).await
    }

    /// Applies the stored state to the session. A missing, unreadable or
    /// invalid file leaves the session on its canonical start state.
    pub async fn restore_into(&self, session: &SimulationSession) -> bool {
        let snapshot = match self.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log!("No saved state at {}", self.path.display());
                return false;
            }
            Err(e) => {
                log_warn!("Ignoring saved state: {}", e);
                return false;
            }
        };

        match session.restore(&snapshot).await {
            Ok(restored) => {
                log!(
                    "Restored state from {}: length {}, score {}, deaths {}",
                    self.path.display(),
                    restored.snake.len(),
                    restored.score,
                    restored.deaths
                );
                true
            }
            Err(e) => {
                log_warn!("Ignoring saved state: {}", e);
                false
            }
        }
    }

    pub async fn run_autosave(self, session: SimulationSession, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.save_session(&session).await {
                log_warn!("Failed to save state: {}", e);
            }
        }
    }

    fn file_error(&self, source: std::io::Error) -> ServerError {
        ServerError::StateFile {
            path: self.path.display().to_string(),
            source,
        }
    }
}
