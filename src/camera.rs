use std::mem;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use image::GrayImage;
use log::{error, info, warn};

use crate::store::lock;
use crate::{
    Calibration, CalibrationError, CameraConfig, Device, LocalizationWorker, Marker,
    MarkerDetector, Snapshot, SnapshotStore, StartError, Visualizer, WorkerState,
};

/// What [`CameraHandle::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A worker was already running; nothing changed.
    AlreadyRunning,
}

enum Slot<D, M> {
    Parked(LocalizationWorker<D, M>),
    Spawned(JoinHandle<LocalizationWorker<D, M>>),
    /// The worker thread panicked.
    Lost,
}

/// One camera and its background localization worker.
///
/// The handle is `Sync`, so it can be shared (e.g. in an `Arc`) between any
/// number of reader threads.
pub struct CameraHandle<D: Device, M: MarkerDetector> {
    id: i32,
    calibration: Calibration,
    store: Arc<SnapshotStore>,
    state: Arc<Mutex<WorkerState>>,
    slot: Mutex<Slot<D, M>>,
}

impl<D: Device, M: MarkerDetector> CameraHandle<D, M> {
    pub fn new(config: &CameraConfig, device: D, detector: M) -> Result<Self, CalibrationError> {
        Self::build(config, device, detector, |worker| worker)
    }

    pub fn with_visualizer(
        config: &CameraConfig,
        device: D,
        detector: M,
        visualizer: impl Visualizer,
    ) -> Result<Self, CalibrationError> {
        Self::build(config, device, detector, |worker| {
            worker.with_visualizer(visualizer)
        })
    }

    fn build(
        config: &CameraConfig,
        device: D,
        detector: M,
        finish: impl FnOnce(LocalizationWorker<D, M>) -> LocalizationWorker<D, M>,
    ) -> Result<Self, CalibrationError> {
        let calibration = Calibration::from_config(config)?;
        let store = Arc::new(SnapshotStore::new(config.width, config.height));
        let worker = finish(LocalizationWorker::new(
            config.id,
            calibration,
            Arc::clone(&store),
            device,
            detector,
        ));
        Ok(CameraHandle {
            id: config.id,
            calibration,
            store,
            state: Arc::new(Mutex::new(WorkerState::Idle)),
            slot: Mutex::new(Slot::Parked(worker)),
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.calibration.width()
    }

    pub fn height(&self) -> u32 {
        self.calibration.height()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Drops back to [`WorkerState::Idle`] on its own if the worker thread
    /// panics.
    pub fn state(&self) -> WorkerState {
        *lock(&self.state)
    }

    /// Spawns the worker thread and waits until it has opened the device.
    pub fn start(&self) -> Result<StartOutcome, StartError> {
        let mut slot = lock(&self.slot);
        let worker = match mem::replace(&mut *slot, Slot::Lost) {
            Slot::Parked(worker) => worker,
            // Idle while spawned means the thread is unwinding.
            Slot::Spawned(handle) if handle.is_finished() || self.state() == WorkerState::Idle => {
                match handle.join() {
                    Ok(worker) => worker,
                    Err(_) => {
                        error!("localization worker for camera {} panicked", self.id);
                        return Err(StartError::WorkerLost { camera: self.id });
                    }
                }
            }
            running @ Slot::Spawned(_) => {
                *slot = running;
                warn!("vision algorithm is already running for camera {}", self.id);
                return Ok(StartOutcome::AlreadyRunning);
            }
            Slot::Lost => return Err(StartError::WorkerLost { camera: self.id }),
        };

        let (opened_tx, opened_rx) = mpsc::sync_channel(1);
        let state = Arc::clone(&self.state);
        let handle = thread::spawn(move || worker.run(&state, opened_tx));

        match opened_rx.recv() {
            Ok(Ok(())) => {
                *slot = Slot::Spawned(handle);
                info!("camera {} started", self.id);
                Ok(StartOutcome::Started)
            }
            Ok(Err(err)) => {
                if let Ok(worker) = handle.join() {
                    *slot = Slot::Parked(worker);
                }
                error!("camera {} could not be opened: {err:#}", self.id);
                Err(StartError::OpenFailure {
                    camera: self.id,
                    source: err.into(),
                })
            }
            // The thread died before reporting back.
            Err(_) => {
                _ = handle.join();
                error!("localization worker for camera {} panicked", self.id);
                Err(StartError::WorkerLost { camera: self.id })
            }
        }
    }

    /// Asks the worker to stop and waits for its thread to exit. Does
    /// nothing if no worker is running.
    pub fn stop(&self) {
        let mut slot = lock(&self.slot);
        let handle = match mem::replace(&mut *slot, Slot::Lost) {
            Slot::Spawned(handle) => handle,
            other => {
                *slot = other;
                return;
            }
        };

        *lock(&self.state) = WorkerState::StopRequested;
        match handle.join() {
            Ok(worker) => *slot = Slot::Parked(worker),
            Err(_) => error!("localization worker for camera {} panicked", self.id),
        }
        *lock(&self.state) = WorkerState::Idle;
        info!("camera {} stopped", self.id);
    }

    /// Tag and markers of the latest published cycle, read together.
    pub fn snapshot(&self) -> Snapshot {
        self.store.read()
    }

    pub fn current_tag(&self) -> i64 {
        self.store.tag()
    }

    pub fn current_markers(&self) -> Vec<Marker> {
        self.store.markers()
    }

    pub fn current_frame(&self) -> GrayImage {
        self.store.read_frame()
    }
}

impl<D: Device, M: MarkerDetector> Drop for CameraHandle<D, M> {
    fn drop(&mut self) {
        self.stop();
    }
}
