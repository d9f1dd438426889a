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


//! Still-image face detection with boosted Haar cascades.
//!
//! A [`Pipeline`] turns an image file into a [`PipelineOutcome`]: a
//! [`Verdict`], the image to display (annotated with a rectangle around every
//! face found) and a diagnostic trail.
//!
//! ```no_run
//! use facescan::{DetectorConfig, Pipeline, Verdict};
//!
//! let pipeline = Pipeline::from_cascade_path(
//!     "haarcascade_frontalface_default.xml",
//!     DetectorConfig::default(),
//! )
//! .unwrap();
//!
//! let outcome = pipeline.process("portrait.jpg");
//! for line in outcome.log() {
//!     println!("{}", line);
//! }
//! if outcome.verdict() == Verdict::FacesFound {
//!     println!("faces: {:?}", outcome.faces());
//! }
//! ```

mod classifier;
mod common;
mod config;
mod detector;
mod error;
mod feat;
pub mod math;
pub mod model;
mod pipeline;

pub use crate::classifier::{
    ClassifierKind, HaarCascade, HaarFeature, HaarRect, Score, Stage, TreeNode, WeakClassifier,
};
pub use crate::common::{BoundingBox, ImageData, PixelLayout, RasterImage};
pub use crate::config::DetectorConfig;
pub use crate::detector::{group_rectangles, CascadeDetector, Detector, GROUP_EPS};
pub use crate::error::{ConfigError, DetectError, LoadError, ModelError, RasterError, StartupError};
pub use crate::feat::{FeatureMap, HaarFeatureMap};
pub use crate::model::{load_model, read_model, Model};
pub use crate::pipeline::{
    draw_faces, load_for_detection, load_for_display, Pipeline, PipelineOutcome, Verdict,
    DETECTION_FORMATS, STROKE_COLOR, STROKE_WIDTH,
};

use std::path::Path;
use std::sync::Arc;

/// Create a face detector, based on an OpenCV cascade XML file.
pub fn create_detector<P: AsRef<Path>>(
    path_to_model: P,
    config: DetectorConfig,
) -> Result<Box<dyn Detector>, ModelError> {
    let model = load_model(path_to_model)?;
    Ok(create_detector_with_model(Arc::new(model), config))
}

/// Create a face detector, based on the provided model.
pub fn create_detector_with_model(model: Arc<Model>, config: DetectorConfig) -> Box<dyn Detector> {
    Box::new(CascadeDetector::new(model, config))
}
