use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{debug, info, trace, warn};

use crate::store::lock;
use crate::{
    Calibration, Device, FrameSource, Marker, MarkerDetector, SnapshotStore, Visualizer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    StopRequested,
}

/// Outcome of a single pass of the localization loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// No usable frame; nothing was published.
    FrameMiss,
    /// The frame was published but no marker was found.
    Empty,
    Published { tag: i64, markers: usize },
}

/// Pulls frames, detects markers and publishes them into a
/// [`SnapshotStore`].
pub struct LocalizationWorker<D, M> {
    camera: i32,
    calibration: Calibration,
    store: Arc<SnapshotStore>,
    device: D,
    detector: M,
    visualizer: Option<Box<dyn Visualizer>>,
}

impl<D, M: MarkerDetector> LocalizationWorker<D, M> {
    pub fn new(
        camera: i32,
        calibration: Calibration,
        store: Arc<SnapshotStore>,
        device: D,
        detector: M,
    ) -> Self {
        LocalizationWorker {
            camera,
            calibration,
            store,
            device,
            detector,
            visualizer: None,
        }
    }

    pub fn with_visualizer(mut self, visualizer: impl Visualizer) -> Self {
        self.visualizer = Some(Box::new(visualizer));
        self
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Runs one pass: grab, publish the frame, detect, publish the markers.
    ///
    /// The markers are only published when at least one was detected, so an
    /// empty pass leaves the previous snapshot and its tag in place.
    pub fn cycle(&mut self, source: &mut impl FrameSource) -> Cycle {
        let frame = match source.grab() {
            Ok(frame) => frame.into_luma8(),
            Err(err) => {
                debug!("camera {}: no frame: {err:#}", self.camera);
                return Cycle::FrameMiss;
            }
        };
        let expected = (self.calibration.width(), self.calibration.height());
        if frame.dimensions() != expected {
            debug!(
                "camera {}: dropping {:?} frame, expected {:?}",
                self.camera,
                frame.dimensions(),
                expected
            );
            return Cycle::FrameMiss;
        }
        self.store.publish_frame(&frame);

        let detections = self.detector.detect(&frame).unwrap_or_else(|err| {
            warn!("camera {}: detection failed: {err:#}", self.camera);
            Vec::new()
        });
        let markers: Vec<Marker> = detections
            .iter()
            .map(|detection| Marker::from_detection(detection, &self.calibration))
            .collect();

        let cycle = if markers.is_empty() {
            Cycle::Empty
        } else {
            let count = markers.len();
            let tag = self.store.publish(markers);
            trace!("camera {}: published {count} markers as tag {tag}", self.camera);
            Cycle::Published {
                tag,
                markers: count,
            }
        };

        if let Some(visualizer) = &mut self.visualizer {
            visualizer.show(&frame, &detections);
        }
        cycle
    }
}

impl<D: Device, M: MarkerDetector> LocalizationWorker<D, M> {
    /// Body of the worker thread.
    ///
    /// The result of opening the device is sent on `opened` before the loop
    /// starts, and the state is already [`WorkerState::Running`] by then. The
    /// worker is handed back when the loop observes
    /// [`WorkerState::StopRequested`] or the device fails to open. If a cycle
    /// panics the state falls back to [`WorkerState::Idle`].
    pub(crate) fn run(
        mut self,
        state: &Mutex<WorkerState>,
        opened: SyncSender<Result<()>>,
    ) -> Self {
        let (width, height) = (self.calibration.width(), self.calibration.height());
        let mut source = match self.device.open(width, height) {
            Ok(source) => source,
            Err(err) => {
                _ = opened.send(Err(err));
                return self;
            }
        };
        let _unwind = IdleOnUnwind(state);
        *lock(state) = WorkerState::Running;
        if opened.send(Ok(())).is_err() {
            *lock(state) = WorkerState::Idle;
            return self;
        }

        info!("camera {}: localization started", self.camera);
        let mut cycles: u64 = 0;
        while *lock(state) != WorkerState::StopRequested {
            self.cycle(&mut source);
            cycles += 1;
        }
        drop(source);
        info!(
            "camera {}: localization stopped after {cycles} cycles",
            self.camera
        );
        self
    }
}

struct IdleOnUnwind<'a>(&'a Mutex<WorkerState>);

impl Drop for IdleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            *lock(self.0) = WorkerState::Idle;
        }
    }
}
