// This file is part of facescan, a still-image face detection and annotation library.
//
// This file is part of the detection module, containing codes implementing the face detection method described in the following paper:
//
//      Rapid Object Detection using a Boosted Cascade of Simple Features,
//      Paul Viola, Michael Jones.
//      In Proceedings of CVPR 2001
//
// As an open-source face detection library: you can redistribute facescan source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

mod grouping;

use std::sync::Arc;

use log::debug;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub use self::grouping::{group_rectangles, GROUP_EPS};

use crate::common::{BoundingBox, ImageData, ImagePyramid, Seq};
use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::feat::{FeatureMap, HaarFeatureMap};
use crate::model::Model;

/// Face detector.
///
/// # Examples
///
/// ```no_run
/// use facescan::{Detector, DetectorConfig, ImageData};
///
/// let detector = facescan::create_detector(
///     "haarcascade_frontalface_default.xml",
///     DetectorConfig::default(),
/// )
/// .unwrap();
///
/// let gray = vec![0u8; 640 * 480];
/// for face in detector.detect(&ImageData::new(&gray, 640, 480)).unwrap() {
///     println!("found face: {:?}", face);
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Detect faces on a gray-scale image.
    ///
    /// Boxes are in the coordinates of `image`, inside its bounds, in the
    /// order their clusters were first seen. No faces is an empty vector,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Fails if `image` is not a legal image, e.g. it
    /// - is not gray-scale (`num_channels` is not equal to 1)
    /// - has `width` or `height` equal to 0
    /// - has a buffer of the wrong length
    fn detect(&self, image: &ImageData) -> Result<Vec<BoundingBox>, DetectError>;

    fn config(&self) -> &DetectorConfig;
}

/// Multi-scale sliding window search with a boosted Haar cascade.
pub struct CascadeDetector {
    model: Arc<Model>,
    config: DetectorConfig,
}

impl Detector for CascadeDetector {
    fn detect(&self, image: &ImageData) -> Result<Vec<BoundingBox>, DetectError> {
        check_image(image)?;

        let (window_width, window_height) = self.model.window_size();
        let mut pyramid = ImagePyramid::new(*image, window_width, window_height);
        pyramid.set_scale_step(self.config.scale_factor());
        let (min_width, min_height) = self.config.min_size();
        pyramid.set_min_window(min_width, min_height);
        pyramid.set_max_window(self.config.max_size());

        let scales = pyramid.scales();
        let candidates = self.scan(&pyramid, &scales);

        let faces: Vec<BoundingBox> =
            group_rectangles(&candidates, self.config.min_neighbors(), GROUP_EPS)
                .into_iter()
                .filter_map(|face| face.clamp_to(image.width(), image.height()))
                .collect();

        debug!(
            "searched {} scales of a {}x{} image: {} candidate windows, {} faces",
            scales.len(),
            image.width(),
            image.height(),
            candidates.len(),
            faces.len()
        );
        Ok(faces)
    }

    fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl CascadeDetector {
    pub fn new(model: Arc<Model>, config: DetectorConfig) -> Self {
        CascadeDetector { model, config }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    #[cfg(feature = "rayon")]
    fn scan(&self, pyramid: &ImagePyramid, scales: &[f64]) -> Vec<BoundingBox> {
        // one vector per level, concatenated in scale order
        let levels: Vec<Vec<BoundingBox>> = scales
            .par_iter()
            .map(|&factor| self.scan_level(pyramid, factor))
            .collect();
        levels.into_iter().flatten().collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn scan(&self, pyramid: &ImagePyramid, scales: &[f64]) -> Vec<BoundingBox> {
        scales
            .iter()
            .flat_map(|&factor| self.scan_level(pyramid, factor))
            .collect()
    }

    /// Candidate windows of one pyramid level, in original image coordinates.
    fn scan_level(&self, pyramid: &ImagePyramid, factor: f64) -> Vec<BoundingBox> {
        let classifier = self.model.get_classifier();
        let scaled = pyramid.scaled_image(factor);

        let mut feature_map = HaarFeatureMap::new();
        feature_map.compute(&scaled.as_image_data());

        let step = if factor > 2.0 { 1 } else { 2 };
        let max_x = scaled.width().saturating_sub(classifier.window_width());
        let max_y = scaled.height().saturating_sub(classifier.window_height());
        let (window_width, window_height) = pyramid.window_size(factor);

        let mut candidates = Vec::new();
        for y in Seq::new(0u32, move |n| n + step).take_while(move |n| *n < max_y) {
            for x in Seq::new(0u32, move |n| n + step).take_while(move |n| *n < max_x) {
                if classifier.classify(&feature_map, x, y).is_positive() {
                    candidates.push(BoundingBox::new(
                        (f64::from(x) * factor).round() as i32,
                        (f64::from(y) * factor).round() as i32,
                        window_width,
                        window_height,
                    ));
                }
            }
        }
        candidates
    }
}

fn check_image(image: &ImageData) -> Result<(), DetectError> {
    if image.num_channels() != 1 {
        return Err(DetectError::NotGrayscale(image.num_channels()));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectError::EmptyImage);
    }

    let expected = image.width() as usize * image.height() as usize;
    if image.data().len() != expected {
        return Err(DetectError::BufferSize {
            expected,
            actual: image.data().len(),
        });
    }
    Ok(())
}
