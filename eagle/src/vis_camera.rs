use image::GrayImage;
use kestrel::{Detection, Visualizer};
use log::debug;
use rerun::{components::Position2D, Points2D, RecordingStream};

/// Streams every frame and its detected corners to a rerun viewer.
pub struct RerunVisualizer {
    rec: RecordingStream,
    entity_path: String,
}

impl RerunVisualizer {
    pub fn new(rec: RecordingStream, entity_path: impl Into<String>) -> Self {
        RerunVisualizer {
            rec,
            entity_path: entity_path.into(),
        }
    }
}

impl Visualizer for RerunVisualizer {
    fn show(&mut self, frame: &GrayImage, detections: &[Detection]) {
        // rerun bundles its own `image` version.
        let Some(image) = rerun::external::image::GrayImage::from_raw(
            frame.width(),
            frame.height(),
            frame.as_raw().clone(),
        ) else {
            return;
        };
        match rerun::Image::try_from(image) {
            Ok(image) => {
                if let Err(err) = self.rec.log(format!("{}/image", self.entity_path), &image) {
                    debug!("rerun: {err}");
                }
            }
            Err(err) => debug!("rerun: {err}"),
        }

        let corners = detections
            .iter()
            .flat_map(|detection| detection.corners)
            .map(|p| Position2D::new(p.x as f32, p.y as f32));
        let labels = detections
            .iter()
            .flat_map(|detection| std::iter::repeat(detection.id.to_string()).take(4));
        if let Err(err) = self.rec.log(
            format!("{}/markers", self.entity_path),
            &Points2D::new(corners).with_labels(labels),
        ) {
            debug!("rerun: {err}");
        }
    }
}
