use anyhow::Result;
use glam::DVec2;
use image::GrayImage;
use kestrel::{Detection, MarkerDetector};
use opencv::{
    core::{no_array, Point2f, Vector},
    objdetect::{
        get_predefined_dictionary, ArucoDetector, DetectorParameters, PredefinedDictionaryType,
        RefineParameters,
    },
    prelude::{ArucoDetectorTraitConst, Mat},
};

/// ArUco detector over the original ArUco dictionary.
pub struct Detector {
    detector: ArucoDetector,
}

impl Detector {
    pub fn new() -> Result<Self> {
        Self::with_dictionary(PredefinedDictionaryType::DICT_ARUCO_ORIGINAL)
    }

    pub fn with_dictionary(dictionary: PredefinedDictionaryType) -> Result<Self> {
        let aruco_dict = get_predefined_dictionary(dictionary)?;
        let detec_params = DetectorParameters::default()?;
        let detector = ArucoDetector::new(
            &aruco_dict,
            &detec_params,
            RefineParameters::new(10., 6., true)?,
        )?;
        Ok(Self { detector })
    }
}

impl MarkerDetector for Detector {
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Detection>> {
        let mut corners: Vector<Vector<Point2f>> = Vector::new();
        let mut ids: Vector<i32> = Vector::new();
        let mut rejected = no_array();

        let mat = Mat::from_slice_rows_cols(
            frame.as_raw().as_slice(),
            frame.height() as usize,
            frame.width() as usize,
        )?;
        self.detector
            .detect_markers(&mat, &mut corners, &mut ids, &mut rejected)?;

        // Corners stay in OpenCV's order, clockwise from the top left.
        Ok(ids
            .into_iter()
            .zip(corners)
            .filter_map(|(id, quad)| {
                let points: Vec<DVec2> = quad
                    .into_iter()
                    .map(|point| DVec2::new(point.x as f64, point.y as f64))
                    .collect();
                Some(Detection::new(id, points.try_into().ok()?))
            })
            .collect())
    }
}
