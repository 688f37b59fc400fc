use glam::DVec2;

use crate::Calibration;

/// The four corners of a detected marker in pixel space, in detector
/// order `(p00, p10, p01, p11)`.
pub type Quad = [DVec2; 4];

/// Raw output of a [`MarkerDetector`](crate::MarkerDetector) for one marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub id: i32,
    pub corners: Quad,
}

impl Detection {
    pub fn new(id: i32, corners: Quad) -> Self {
        Detection { id, corners }
    }
}

/// Position and orientation of a marker in one coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// First detected corner.
    pub corner: DVec2,
    pub center: DVec2,
    /// Radians, counter-clockwise from the horizontal.
    pub heading: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: i32,
    pub camera: Placement,
    pub world: Placement,
}

impl Marker {
    pub fn from_detection(detection: &Detection, calibration: &Calibration) -> Self {
        let [p00, p10, p01, p11] = detection.corners;

        // Mean of the two diagonal midpoints.
        let center = ((p00 + p11) / 2.0 + (p10 + p01) / 2.0) / 2.0;
        let edge = p10 - p00;
        let camera = Placement {
            corner: p00,
            center,
            heading: edge.y.atan2(edge.x),
        };
        let world = Placement {
            corner: calibration.to_world(camera.corner),
            center: calibration.to_world(camera.center),
            heading: calibration.heading_to_world(camera.heading),
        };

        Marker {
            id: detection.id,
            camera,
            world,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn square(id: i32) -> Detection {
        Detection::new(
            id,
            [
                DVec2::new(100.0, 100.0),
                DVec2::new(200.0, 100.0),
                DVec2::new(100.0, 160.0),
                DVec2::new(200.0, 160.0),
            ],
        )
    }

    #[test]
    fn axis_aligned_marker() {
        let calib = Calibration::new(640, 480, 2.0, DVec2::ZERO, 0.0).unwrap();
        let marker = Marker::from_detection(&square(7), &calib);

        assert_eq!(marker.id, 7);
        assert_eq!(marker.camera.corner, DVec2::new(100.0, 100.0));
        assert_eq!(marker.camera.center, DVec2::new(150.0, 130.0));
        assert_abs_diff_eq!(marker.camera.heading, 0.0);

        assert_abs_diff_eq!(marker.world.corner.x, 0.4167, epsilon = 1e-4);
        assert_abs_diff_eq!(marker.world.corner.y, 0.4167, epsilon = 1e-4);
        assert_abs_diff_eq!(marker.world.center.x, 0.625, epsilon = 1e-4);
        assert_abs_diff_eq!(marker.world.center.y, 0.5417, epsilon = 1e-4);
        assert_abs_diff_eq!(marker.world.heading, 0.0);
    }

    #[test]
    fn heading_follows_first_edge() {
        let calib = Calibration::new(640, 480, 2.0, DVec2::ZERO, 0.25).unwrap();
        let detection = Detection::new(
            3,
            [
                DVec2::new(50.0, 50.0),
                DVec2::new(50.0, 90.0),
                DVec2::new(10.0, 50.0),
                DVec2::new(10.0, 90.0),
            ],
        );
        let marker = Marker::from_detection(&detection, &calib);
        assert_abs_diff_eq!(marker.camera.heading, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(marker.world.heading, FRAC_PI_2 - 0.25, epsilon = 1e-12);
        assert_eq!(marker.camera.center, DVec2::new(30.0, 70.0));
    }

    #[test]
    fn sub_pixel_corners_are_kept() {
        let calib = Calibration::new(640, 480, 480.0, DVec2::ZERO, 0.0).unwrap();
        let detection = Detection::new(
            1,
            [
                DVec2::new(10.5, 20.25),
                DVec2::new(30.5, 20.25),
                DVec2::new(10.5, 41.0),
                DVec2::new(30.5, 41.0),
            ],
        );
        let marker = Marker::from_detection(&detection, &calib);
        assert_eq!(marker.camera.corner, DVec2::new(10.5, 20.25));
        assert_abs_diff_eq!(marker.camera.center.x, 20.5, epsilon = 1e-12);
        assert_abs_diff_eq!(marker.camera.center.y, 30.625, epsilon = 1e-12);
        assert_abs_diff_eq!(marker.world.center.y, 30.625, epsilon = 1e-12);
    }

    #[test]
    fn world_values_use_the_calibration() {
        let calib = Calibration::new(640, 480, 2.0, DVec2::new(1.0, -2.0), 0.4).unwrap();
        let marker = Marker::from_detection(&square(9), &calib);
        assert_eq!(marker.world.corner, calib.to_world(marker.camera.corner));
        assert_eq!(marker.world.center, calib.to_world(marker.camera.center));
        assert_abs_diff_eq!(marker.world.heading, -0.4, epsilon = 1e-12);
    }
}
