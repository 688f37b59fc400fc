mod capture;
mod markers;
#[cfg(feature = "vis")]
mod vis_camera;

pub use crate::capture::{VideoDevice, VideoSource};
pub use crate::markers::Detector;
#[cfg(feature = "vis")]
pub use crate::vis_camera::RerunVisualizer;
