mod calibration;
mod camera;
mod config;
mod error;
mod marker;
mod source;
mod store;
mod worker;

pub use crate::calibration::Calibration;
pub use crate::camera::{CameraHandle, StartOutcome};
pub use crate::config::CameraConfig;
pub use crate::error::{CalibrationError, StartError};
pub use crate::marker::{Detection, Marker, Placement, Quad};
pub use crate::source::{Device, FrameSource, MarkerDetector, Visualizer};
pub use crate::store::{Snapshot, SnapshotStore, INITIAL_TAG};
pub use crate::worker::{Cycle, LocalizationWorker, WorkerState};
