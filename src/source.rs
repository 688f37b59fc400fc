//! Collaborators the localization loop is built around.

use anyhow::Result;
use image::{DynamicImage, GrayImage};

use crate::Detection;

/// A capture device that can be opened once per worker run.
///
/// `open` is called on the worker thread, so only the device itself has to
/// be `Send`; the opened source never leaves that thread.
pub trait Device: Send + 'static {
    type Source: FrameSource;

    fn open(&mut self, width: u32, height: u32) -> Result<Self::Source>;
}

pub trait FrameSource {
    /// Blocks until the next frame is available. An error skips the cycle.
    fn grab(&mut self) -> Result<DynamicImage>;
}

pub trait MarkerDetector: Send + 'static {
    /// Detects every marker in `frame`, corners in `(p00, p10, p01, p11)`
    /// order.
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Detection>>;
}

/// Receives every captured frame together with its detections.
///
/// Called on the worker thread after the cycle has been published.
pub trait Visualizer: Send + 'static {
    fn show(&mut self, frame: &GrayImage, detections: &[Detection]);
}

impl<F> Visualizer for F
where
    F: FnMut(&GrayImage, &[Detection]) + Send + 'static,
{
    fn show(&mut self, frame: &GrayImage, detections: &[Detection]) {
        self(frame, detections)
    }
}
