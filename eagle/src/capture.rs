use anyhow::{bail, Context, Result};
use image::{DynamicImage, GrayImage};
use kestrel::{Device, FrameSource};
use opencv::{
    core::Mat,
    imgproc::{cvt_color_def, COLOR_BGR2GRAY},
    prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst},
    videoio::{self, VideoCapture},
};

/// A camera reachable through OpenCV's `VideoCapture`.
pub struct VideoDevice {
    index: i32,
}

impl VideoDevice {
    pub fn new(index: i32) -> Self {
        VideoDevice { index }
    }
}

impl Device for VideoDevice {
    type Source = VideoSource;

    fn open(&mut self, width: u32, height: u32) -> Result<VideoSource> {
        let mut capture = VideoCapture::new(self.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            bail!("camera {} is already in use", self.index);
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        check_mode(
            (width, height),
            (
                capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
                capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            ),
        )
        .with_context(|| format!("camera {}", self.index))?;
        Ok(VideoSource {
            capture,
            frame: Mat::default(),
            grey: Mat::default(),
        })
    }
}

pub struct VideoSource {
    capture: VideoCapture,
    frame: Mat,
    grey: Mat,
}

impl FrameSource for VideoSource {
    fn grab(&mut self) -> Result<DynamicImage> {
        if !self.capture.read(&mut self.frame)? || self.frame.rows() == 0 {
            bail!("capture returned no frame");
        }
        cvt_color_def(&self.frame, &mut self.grey, COLOR_BGR2GRAY)?;
        Ok(DynamicImage::ImageLuma8(mat_to_image(&self.grey)?))
    }
}

/// Fails unless the capture settled on the requested frame size.
fn check_mode(requested: (u32, u32), actual: (f64, f64)) -> Result<()> {
    let (width, height) = requested;
    if actual.0.round() != width as f64 || actual.1.round() != height as f64 {
        bail!(
            "requested {width}x{height} frames but the capture delivers {}x{}",
            actual.0,
            actual.1
        );
    }
    Ok(())
}

/// Copies a single channel 8-bit `Mat` into a `GrayImage`.
pub(crate) fn mat_to_image(mat: &Mat) -> Result<GrayImage> {
    let data: Vec<u8> = mat.iter::<u8>()?.map(|(_, v)| v).collect();
    GrayImage::from_vec(mat.cols() as u32, mat.rows() as u32, data)
        .context("matrix is not a single channel 8-bit image")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_mode_passes() {
        check_mode((640, 480), (640.0, 480.0)).unwrap();
    }

    #[test]
    fn ignored_mode_is_an_error() {
        let err = check_mode((640, 480), (1280.0, 720.0)).unwrap_err();
        assert!(err.to_string().contains("1280x720"), "{err}");
        assert!(check_mode((640, 480), (640.0, 360.0)).is_err());
    }
}
