// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

pub use crate::error::CaptureError;
use crate::error_handling::{report_error, ErrorSeverity};

pub mod external;
pub mod normalize;

pub use external::{builtin_grabbers, program_on_path, CommandTemplate, ExternalGrabber};
pub use normalize::{Normalizer, DEFAULT_OUTPUT_SIZE};

/// Grabber name that picks the first available tool
pub const AUTO: &str = "auto";

#[async_trait]
pub trait RegionGrabber: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Let the user select a screen region and write it to `target` as PNG.
    async fn grab(&self, target: &Path) -> Result<(), CaptureError>;

    fn name(&self) -> &str;
}

/// A region grabber followed by a normalisation step.
///
/// Cheap to clone, so a copy can be moved into the UI task that runs it.
#[derive(Clone)]
pub struct CapturePipeline {
    grabber: Arc<dyn RegionGrabber>,
    normalizer: Normalizer,
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("grabber", &self.grabber.name())
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

impl CapturePipeline {
    #[must_use]
    pub fn new(grabber: Arc<dyn RegionGrabber>, normalizer: Normalizer) -> Self {
        Self { grabber, normalizer }
    }

    /// Build a pipeline from the builtin grabbers.
    ///
    /// `auto` tries the grabbers in order of preference and takes the first
    /// one found on `PATH`. An external normaliser whose tool is missing is
    /// replaced by the builtin one.
    ///
    /// # Errors
    /// Returns `CaptureError::NotAvailable` if no matching grabber is installed
    pub async fn select(grabber_name: &str, normalizer: Normalizer) -> Result<Self, CaptureError> {
        let mut chosen = None;
        for grabber in builtin_grabbers() {
            let wanted = grabber_name.eq_ignore_ascii_case(AUTO)
                || grabber.name().eq_ignore_ascii_case(grabber_name);
            if wanted && grabber.is_available().await {
                chosen = Some(grabber);
                break;
            }
            if wanted {
                log::debug!("grabber {} not found on PATH", grabber.name());
            }
        }
        let grabber = chosen.ok_or(CaptureError::NotAvailable)?;
        log::info!("using region grabber `{}`", grabber.name());

        let normalizer = if normalizer.is_available() {
            normalizer
        } else {
            report_error(
                ErrorSeverity::Warning,
                "Normaliser Fallback",
                "`convert` not found, resizing captures in-process instead",
            );
            normalizer.builtin_fallback()
        };

        Ok(Self::new(Arc::new(grabber), normalizer))
    }

    #[must_use]
    pub fn grabber_name(&self) -> &str {
        self.grabber.name()
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Grab a region into a scratch file, then normalise it into `target`.
    ///
    /// # Errors
    /// Returns `CaptureError` if either tool fails or the grabber wrote nothing
    pub async fn capture(&self, target: &Path) -> Result<(), CaptureError> {
        let scratch = tempfile::Builder::new()
            .prefix("batchshot-")
            .suffix(".png")
            .tempfile()?;

        self.grabber.grab(scratch.path()).await?;

        let written = tokio::fs::metadata(scratch.path()).await?.len();
        if written == 0 {
            return Err(CaptureError::NoImage(self.grabber.name().to_string()));
        }

        self.normalizer.apply(scratch.path(), target).await
    }
}
