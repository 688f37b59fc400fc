//! Published localization state.
//!
//! Markers and the generation tag share one lock, the frame has its own.
//! Every critical section is a copy, so a reader never waits on detection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use image::GrayImage;

use crate::Marker;

/// Tag value before the first published detection.
pub const INITIAL_TAG: i64 = -1;

/// Markers of one detection cycle together with the tag they were
/// published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tag: i64,
    pub markers: Vec<Marker>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            tag: INITIAL_TAG,
            markers: Vec::new(),
        }
    }
}

pub struct SnapshotStore {
    localization: Mutex<Snapshot>,
    frame: Mutex<GrayImage>,
}

// Writers only ever replace whole values, so a poisoned lock still holds a
// consistent one.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SnapshotStore {
    /// Empty store with a black `width` x `height` frame.
    pub fn new(width: u32, height: u32) -> Self {
        SnapshotStore {
            localization: Mutex::new(Snapshot::default()),
            frame: Mutex::new(GrayImage::new(width, height)),
        }
    }

    /// Replaces the markers and bumps the tag, returning the new tag.
    pub fn publish(&self, markers: Vec<Marker>) -> i64 {
        let mut snapshot = lock(&self.localization);
        snapshot.markers = markers;
        snapshot.tag += 1;
        snapshot.tag
    }

    pub fn read(&self) -> Snapshot {
        lock(&self.localization).clone()
    }

    pub fn tag(&self) -> i64 {
        lock(&self.localization).tag
    }

    pub fn markers(&self) -> Vec<Marker> {
        lock(&self.localization).markers.clone()
    }

    /// Overwrites the frame buffer with `frame`.
    pub fn publish_frame(&self, frame: &GrayImage) {
        lock(&self.frame).clone_from(frame);
    }

    pub fn read_frame(&self) -> GrayImage {
        lock(&self.frame).clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use glam::DVec2;
    use image::Luma;

    use super::*;
    use crate::{Calibration, Detection};

    fn markers(ids: &[i32]) -> Vec<Marker> {
        let calib = Calibration::new(64, 48, 1.0, DVec2::ZERO, 0.0).unwrap();
        ids.iter()
            .map(|&id| {
                let base = DVec2::splat(id as f64);
                let quad = [
                    base,
                    base + DVec2::X,
                    base + DVec2::Y,
                    base + DVec2::ONE,
                ];
                Marker::from_detection(&Detection::new(id, quad), &calib)
            })
            .collect()
    }

    #[test]
    fn starts_empty() {
        let store = SnapshotStore::new(4, 3);
        assert_eq!(store.read(), Snapshot::default());
        assert_eq!(store.tag(), INITIAL_TAG);
        assert!(store.markers().is_empty());

        let frame = store.read_frame();
        assert_eq!(frame.dimensions(), (4, 3));
        assert!(frame.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn publish_replaces_markers_and_bumps_tag() {
        let store = SnapshotStore::new(4, 3);
        assert_eq!(store.publish(markers(&[1, 2])), 0);
        assert_eq!(store.publish(markers(&[5])), 1);

        let snapshot = store.read();
        assert_eq!(snapshot.tag, 1);
        assert_eq!(snapshot.markers, markers(&[5]));
    }

    #[test]
    fn frame_copy_is_independent() {
        let store = SnapshotStore::new(2, 2);
        let mut frame = GrayImage::from_pixel(2, 2, Luma([9]));
        store.publish_frame(&frame);

        frame.put_pixel(0, 0, Luma([200]));
        let copy = store.read_frame();
        assert_eq!(copy.get_pixel(0, 0), &Luma([9]));
        assert_eq!(store.tag(), INITIAL_TAG);
    }

    #[test]
    fn readers_never_see_a_torn_snapshot() {
        let store = Arc::new(SnapshotStore::new(4, 3));

        // Publish `n` carries `n % 7 + 1` markers, all with id `n`.
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..500 {
                    store.publish(markers(&vec![n; n as usize % 7 + 1]));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut last = INITIAL_TAG;
                    for _ in 0..2000 {
                        let snapshot = store.read();
                        assert!(snapshot.tag >= last);
                        last = snapshot.tag;
                        if snapshot.tag == INITIAL_TAG {
                            assert!(snapshot.markers.is_empty());
                            continue;
                        }
                        let n = snapshot.tag as i32;
                        assert_eq!(snapshot.markers.len(), n as usize % 7 + 1);
                        assert!(snapshot.markers.iter().all(|m| m.id == n));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.tag(), 499);
    }
}
