// SPDX-License-Identifier: GPL-3.0-only

//! The batch session: a scoped temporary directory holding captures
//! `00000.png`, `00001.png`, ... and the counter that indexes them.
//!
//! Files `0..counter` exist in the directory and no others. The counter only
//! moves forward once the capture for that index is on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::capture::CapturePipeline;
pub use crate::error::SessionError;

/// Name of the folder created inside the chosen save directory
pub const EXPORT_DIR_NAME: &str = "_batchshot_images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Nothing captured yet, state unchanged
    NothingToUndo,
    /// The capture with this index was deleted
    Removed(usize),
}

/// File name of the capture at `index`
#[must_use]
pub fn capture_file_name(index: usize) -> String {
    format!("{index:05}.png")
}

#[derive(Debug)]
pub struct Session {
    dir: Option<TempDir>,
    path: PathBuf,
    counter: usize,
    pending: Option<PathBuf>,
    state: SessionState,
}

impl Session {
    /// Create a session in the system temporary directory.
    ///
    /// # Errors
    /// Returns `SessionError::Io` if the directory cannot be created
    pub fn new() -> Result<Self, SessionError> {
        let dir = tempfile::Builder::new().prefix("batchshot-").tempdir()?;
        Ok(Self::from_dir(dir))
    }

    /// Create a session below `parent` instead of the system temporary directory.
    ///
    /// # Errors
    /// Returns `SessionError::Io` if the directory cannot be created
    pub fn new_in(parent: &Path) -> Result<Self, SessionError> {
        let dir = tempfile::Builder::new().prefix("batchshot-").tempdir_in(parent)?;
        Ok(Self::from_dir(dir))
    }

    fn from_dir(dir: TempDir) -> Self {
        let path = dir.path().to_path_buf();
        log::debug!("session directory {}", path.display());
        Self {
            dir: Some(dir),
            path,
            counter: 0,
            pending: None,
            state: SessionState::Active,
        }
    }

    #[must_use]
    pub fn counter(&self) -> usize {
        self.counter
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.pending.is_some()
    }

    /// The temporary directory holding the captures
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn image_path(&self, index: usize) -> PathBuf {
        self.path.join(capture_file_name(index))
    }

    /// The most recent capture, if any
    #[must_use]
    pub fn latest(&self) -> Option<PathBuf> {
        self.counter.checked_sub(1).map(|index| self.image_path(index))
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Ended => Err(SessionError::Ended),
        }
    }

    /// Reserve the path for the next capture.
    ///
    /// # Errors
    /// Fails if the session has ended or another capture is still running
    pub fn begin_capture(&mut self) -> Result<PathBuf, SessionError> {
        self.ensure_active()?;
        if self.pending.is_some() {
            return Err(SessionError::CaptureInProgress);
        }
        let target = self.image_path(self.counter);
        self.pending = Some(target.clone());
        Ok(target)
    }

    /// Accept the pending capture and advance the counter.
    ///
    /// Returns the new counter value.
    ///
    /// # Errors
    /// Returns `SessionError::CaptureMissing` if the tool left no file behind
    pub fn finish_capture(&mut self) -> Result<usize, SessionError> {
        let target = self.pending.take().ok_or(SessionError::NoPendingCapture)?;
        if !target.is_file() {
            return Err(SessionError::CaptureMissing(target));
        }
        self.counter += 1;
        log::debug!("captured {} ({} total)", target.display(), self.counter);
        Ok(self.counter)
    }

    /// Drop the pending capture, removing anything the tools left behind.
    pub fn abort_capture(&mut self) {
        if let Some(target) = self.pending.take() {
            if target.exists() {
                if let Err(e) = fs::remove_file(&target) {
                    log::warn!("failed to remove partial capture {}: {e}", target.display());
                }
            }
        }
    }

    /// Run one capture to completion.
    ///
    /// # Errors
    /// Returns `SessionError::Capture` if the pipeline fails; the counter is
    /// unchanged in that case
    pub async fn next(&mut self, pipeline: &CapturePipeline) -> Result<usize, SessionError> {
        let target = self.begin_capture()?;
        match pipeline.capture(&target).await {
            Ok(()) => self.finish_capture(),
            Err(e) => {
                self.abort_capture();
                Err(e.into())
            }
        }
    }

    /// Delete the most recent capture.
    ///
    /// # Errors
    /// Fails if the session has ended, a capture is running or the file
    /// cannot be removed
    pub fn undo(&mut self) -> Result<UndoOutcome, SessionError> {
        self.ensure_active()?;
        if self.pending.is_some() {
            return Err(SessionError::CaptureInProgress);
        }
        if self.counter == 0 {
            return Ok(UndoOutcome::NothingToUndo);
        }

        let index = self.counter - 1;
        match fs::remove_file(self.image_path(index)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("capture {index} was already removed");
            }
            Err(e) => return Err(e.into()),
        }
        self.counter = index;
        Ok(UndoOutcome::Removed(index))
    }

    /// Copy every capture to `root/_batchshot_images` and end the session.
    ///
    /// Returns the folder that was written.
    ///
    /// # Errors
    /// Returns `SessionError::DestinationExists` if the folder is already
    /// there, or `SessionError::Io` if copying fails. The session stays
    /// active on error.
    pub fn save(&mut self, root: &Path) -> Result<PathBuf, SessionError> {
        self.ensure_active()?;
        if self.pending.is_some() {
            return Err(SessionError::CaptureInProgress);
        }

        let destination = root.join(EXPORT_DIR_NAME);
        if destination.exists() {
            return Err(SessionError::DestinationExists(destination));
        }

        if let Err(e) = copy_dir_all(&self.path, &destination) {
            // A partial export would block the next attempt
            if let Err(cleanup) = fs::remove_dir_all(&destination) {
                log::warn!("failed to remove partial export {}: {cleanup}", destination.display());
            }
            return Err(e.into());
        }
        self.state = SessionState::Ended;
        log::info!("saved {} captures to {}", self.counter, destination.display());
        Ok(destination)
    }

    /// End the session without saving.
    pub fn cancel(&mut self) {
        self.abort_capture();
        self.state = SessionState::Ended;
    }

    /// Remove the temporary directory. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.dir.take() {
            log::info!("cleaning up");
            if let Err(e) = dir.close() {
                log::warn!("failed to remove {}: {e}", self.path.display());
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn copy_dir_all(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}
