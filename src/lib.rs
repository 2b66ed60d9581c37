// SPDX-License-Identifier: GPL-3.0-only

//! Batch region screenshots for the COSMIC desktop
//!
//! A session collects one capture per "next selection" in a temporary
//! directory and exports the whole batch to `<dir>/_batchshot_images`.

pub mod capture;
pub mod error;
pub mod preview;
pub mod session;

// Re-export main types for easier usage
pub use capture::{CaptureError, CapturePipeline, Normalizer, RegionGrabber};
pub use session::{Session, SessionError, SessionState, UndoOutcome, EXPORT_DIR_NAME};

pub mod app;
pub mod error_handling;
pub mod settings;
pub mod ui;

/// The current version of the batchshot library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
