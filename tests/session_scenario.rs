// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use batchshot::{
    CaptureError, CapturePipeline, Normalizer, RegionGrabber, Session, SessionError, SessionState,
    UndoOutcome, EXPORT_DIR_NAME,
};
use image::{Rgba, RgbaImage};

/// Writes a differently sized image on every grab
struct CountingGrabber {
    grabs: std::sync::atomic::AtomicU32,
}

#[async_trait]
impl RegionGrabber for CountingGrabber {
    async fn is_available(&self) -> bool {
        true
    }

    async fn grab(&self, target: &Path) -> Result<(), CaptureError> {
        let n = self.grabs.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        RgbaImage::from_pixel(100 * n, 50, Rgba([0, 0, 0, 255])).save(target)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn pipeline(normalizer: Normalizer) -> CapturePipeline {
    CapturePipeline::new(
        Arc::new(CountingGrabber {
            grabs: std::sync::atomic::AtomicU32::new(0),
        }),
        normalizer,
    )
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn three_captures_one_undo_then_save() {
    let scratch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut session = Session::new_in(scratch.path()).unwrap();
    let pipeline = pipeline(Normalizer::None);

    for _ in 0..3 {
        session.next(&pipeline).await.unwrap();
    }
    assert_eq!(session.counter(), 3);
    assert_eq!(file_names(session.dir()), ["00000.png", "00001.png", "00002.png"]);

    assert_eq!(session.undo().unwrap(), UndoOutcome::Removed(2));
    assert_eq!(session.counter(), 2);
    assert!(!session.image_path(2).exists());

    let destination = session.save(out.path()).unwrap();
    assert_eq!(destination, out.path().join(EXPORT_DIR_NAME));
    assert_eq!(file_names(&destination), ["00000.png", "00001.png"]);
    assert_eq!(session.state(), SessionState::Ended);
}

#[tokio::test]
async fn saved_captures_share_the_output_size() {
    let scratch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut session = Session::new_in(scratch.path()).unwrap();
    let pipeline = pipeline(Normalizer::Builtin { size: (320, 180) });

    session.next(&pipeline).await.unwrap();
    session.next(&pipeline).await.unwrap();
    let destination = session.save(out.path()).unwrap();

    for name in file_names(&destination) {
        let img = image::open(destination.join(&name)).unwrap();
        assert_eq!((img.width(), img.height()), (320, 180), "{name}");
    }
}

#[test]
fn undo_at_start_is_informational() {
    let scratch = tempfile::tempdir().unwrap();
    let mut session = Session::new_in(scratch.path()).unwrap();

    assert_eq!(session.undo().unwrap(), UndoOutcome::NothingToUndo);
    assert_eq!(session.counter(), 0);
    assert_eq!(session.state(), SessionState::Active);
}

#[tokio::test]
async fn second_save_into_same_folder_is_refused() {
    let scratch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let pipeline = pipeline(Normalizer::None);

    let mut first = Session::new_in(scratch.path()).unwrap();
    first.next(&pipeline).await.unwrap();
    first.save(out.path()).unwrap();

    let mut second = Session::new_in(scratch.path()).unwrap();
    second.next(&pipeline).await.unwrap();
    let err = second.save(out.path()).unwrap_err();

    assert!(matches!(err, SessionError::DestinationExists(_)));
    assert_eq!(second.state(), SessionState::Active);
    assert_eq!(file_names(&out.path().join(EXPORT_DIR_NAME)), ["00000.png"]);
}

#[test]
fn session_directory_is_removed_when_dropped() {
    let scratch = tempfile::tempdir().unwrap();
    let session = Session::new_in(scratch.path()).unwrap();
    let dir = session.dir().to_path_buf();
    drop(session);
    assert!(!dir.exists());
    assert!(file_names(scratch.path()).is_empty());
}
