use std::error::Error;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("world height must be positive and finite (got {0})")]
    WorldHeight(f64),
    #[error("world offset must be finite (x={x}, y={y}, angle={angle})")]
    Offset { x: f64, y: f64, angle: f64 },
}

/// Failure of [`CameraHandle::start`](crate::CameraHandle::start).
#[derive(thiserror::Error, Debug)]
pub enum StartError {
    #[error("camera {camera} could not be opened")]
    OpenFailure {
        camera: i32,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A previous run panicked and took the device and detector with it.
    #[error("worker for camera {camera} was lost in an earlier run")]
    WorkerLost { camera: i32 },
}
