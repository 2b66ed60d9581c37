// SPDX-License-Identifier: GPL-3.0-only

use std::{io, path::PathBuf, process::ExitStatus};

/// Failures while running the capture tools.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}")]
    ToolFailed { program: String, status: ExitStatus },
    #[error("command template for `{0}` has no {{output}} placeholder")]
    InvalidTemplate(String),
    #[error("`{0}` produced no image")]
    NoImage(String),
    #[error("no region capture tool available")]
    NotAvailable,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Failures of the batch session itself.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("the session has already ended")]
    Ended,
    #[error("a capture is already in progress")]
    CaptureInProgress,
    #[error("no capture is in progress")]
    NoPendingCapture,
    #[error("capture tool did not write {}", .0.display())]
    CaptureMissing(PathBuf),
    #[error("destination {} already exists", .0.display())]
    DestinationExists(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl SessionError {
    /// Short title for the user facing dialog
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::DestinationExists(_) => "Folder Already Exists",
            Self::Capture(_) | Self::CaptureMissing(_) => "Capture Failed",
            Self::Io(_) => "File Error",
            Self::Ended | Self::CaptureInProgress | Self::NoPendingCapture => "Not Possible",
        }
    }
}
