// SPDX-License-Identifier: GPL-3.0-only

//! Fit-and-centre arithmetic shared by the preview canvas and the builtin
//! normaliser.

use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use std::path::Path;

/// Preview canvas size used when nothing else is configured
pub const DEFAULT_PREVIEW_SIZE: (u32, u32) = (640, 360);

/// Fully transparent white, the blank canvas colour
pub const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Largest size with the source aspect ratio that fits inside `canvas`.
///
/// Wider-than-canvas sources are pinned to the canvas width, everything else
/// to the canvas height. Neither side is ever zero.
#[must_use]
pub fn fit_within(source: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (canvas_w, canvas_h) = canvas;
    if src_w == 0 || src_h == 0 {
        return (canvas_w.max(1), canvas_h.max(1));
    }

    let ratio = f64::from(src_w) / f64::from(src_h);
    let canvas_ratio = f64::from(canvas_w) / f64::from(canvas_h);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (w, h) = if ratio > canvas_ratio {
        (canvas_w, (f64::from(canvas_w) / ratio) as u32)
    } else {
        ((f64::from(canvas_h) * ratio) as u32, canvas_h)
    };

    (w.max(1), h.max(1))
}

/// Top-left position that centres `inner` on `canvas`
#[must_use]
pub fn centre_offset(inner: (u32, u32), canvas: (u32, u32)) -> (i64, i64) {
    (
        (i64::from(canvas.0) - i64::from(inner.0)) / 2,
        (i64::from(canvas.1) - i64::from(inner.1)) / 2,
    )
}

/// Scale `img` to fit `canvas` and paste it centred on a `background` fill.
///
/// The result always has exactly the canvas dimensions.
#[must_use]
pub fn fit_centered(img: &DynamicImage, canvas: (u32, u32), background: Rgba<u8>) -> RgbaImage {
    let mut base = RgbaImage::from_pixel(canvas.0, canvas.1, background);
    let (w, h) = fit_within((img.width(), img.height()), canvas);
    let scaled = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
    let (x, y) = centre_offset((w, h), canvas);
    imageops::overlay(&mut base, &scaled, x, y);
    base
}

/// Build the preview shown in the main window.
///
/// `None` yields the blank canvas used before the first capture.
///
/// # Errors
/// Returns `image::ImageError` if the capture cannot be opened or decoded
pub fn compose_preview(
    capture: Option<&Path>,
    canvas: (u32, u32),
) -> Result<RgbaImage, image::ImageError> {
    match capture {
        Some(path) => {
            let img = image::open(path)?;
            Ok(fit_centered(&img, canvas, TRANSPARENT))
        }
        None => Ok(RgbaImage::from_pixel(canvas.0, canvas.1, TRANSPARENT)),
    }
}
