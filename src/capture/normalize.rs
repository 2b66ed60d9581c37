// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::path::Path;

use super::external::{program_on_path, run_tool};
use super::CaptureError;
use crate::preview::{fit_centered, TRANSPARENT};

/// Output resolution every capture is fitted to by default
pub const DEFAULT_OUTPUT_SIZE: (u32, u32) = (1280, 720);

const CONVERT: &str = "convert";

/// What happens to a raw capture before it joins the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Keep the capture as grabbed
    None,
    /// ImageMagick `convert`: resize to fit, then extend to the exact size around the centre
    External { size: (u32, u32) },
    /// Same geometry done with the `image` crate, padding is transparent
    Builtin { size: (u32, u32) },
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::External {
            size: DEFAULT_OUTPUT_SIZE,
        }
    }
}

impl Normalizer {
    #[must_use]
    pub fn output_size(&self) -> Option<(u32, u32)> {
        match self {
            Self::None => None,
            Self::External { size } | Self::Builtin { size } => Some(*size),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            Self::External { .. } => program_on_path(CONVERT),
            Self::None | Self::Builtin { .. } => true,
        }
    }

    /// The in-process equivalent of this normaliser
    #[must_use]
    pub fn builtin_fallback(self) -> Self {
        match self {
            Self::External { size } => Self::Builtin { size },
            other => other,
        }
    }

    /// Write the normalised form of `source` to `target`.
    ///
    /// # Errors
    /// Returns `CaptureError` if `convert` fails, or the image cannot be
    /// decoded, encoded or copied
    pub async fn apply(&self, source: &Path, target: &Path) -> Result<(), CaptureError> {
        match *self {
            Self::None => {
                tokio::fs::copy(source, target).await?;
                Ok(())
            }
            Self::External { size } => run_tool(CONVERT, convert_args(source, target, size)).await,
            Self::Builtin { size } => {
                let source = source.to_path_buf();
                let target = target.to_path_buf();
                tokio::task::spawn_blocking(move || -> Result<(), CaptureError> {
                    let img = image::open(&source)?;
                    fit_centered(&img, size, TRANSPARENT).save(&target)?;
                    Ok(())
                })
                .await
                .map_err(|e| CaptureError::Io(std::io::Error::other(e)))?
            }
        }
    }
}

fn convert_args(source: &Path, target: &Path, size: (u32, u32)) -> Vec<OsString> {
    let geometry = format!("{}x{}", size.0, size.1);
    vec![
        source.as_os_str().to_owned(),
        "-gravity".into(),
        "center".into(),
        "-resize".into(),
        geometry.clone().into(),
        "-extent".into(),
        geometry.into(),
        target.as_os_str().to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn convert_arguments_match_resize_and_extent() {
        let args = convert_args(Path::new("/tmp/in.png"), Path::new("/tmp/00003.png"), (1280, 720));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            [
                "/tmp/in.png",
                "-gravity",
                "center",
                "-resize",
                "1280x720",
                "-extent",
                "1280x720",
                "/tmp/00003.png",
            ]
        );
    }

    #[test]
    fn fallback_keeps_geometry() {
        let external = Normalizer::External { size: (800, 600) };
        assert_eq!(external.builtin_fallback(), Normalizer::Builtin { size: (800, 600) });
        assert_eq!(Normalizer::None.builtin_fallback(), Normalizer::None);
        assert_eq!(Normalizer::default().output_size(), Some(DEFAULT_OUTPUT_SIZE));
        assert_eq!(Normalizer::None.output_size(), None);
    }

    #[tokio::test]
    async fn builtin_pads_small_capture_to_exact_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw.png");
        let target = dir.path().join("00000.png");
        RgbaImage::from_pixel(40, 40, Rgba([0, 128, 0, 255])).save(&source).unwrap();

        Normalizer::Builtin { size: (160, 90) }
            .apply(&source, &target)
            .await
            .unwrap();

        let out = image::open(&target).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (160, 90));
        assert_eq!(out.get_pixel(0, 45), &TRANSPARENT);
        assert_eq!(out.get_pixel(80, 45)[3], 255);
    }

    #[tokio::test]
    async fn builtin_rejects_garbage_input() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw.png");
        std::fs::write(&source, b"garbage").unwrap();

        let err = Normalizer::Builtin { size: (16, 9) }
            .apply(&source, &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Image(_)));
    }
}
