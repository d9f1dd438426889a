// This file is part of facescan, a still-image face detection and annotation library.
//
// As an open-source face detection library: you can redistribute facescan source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.


//! Load, detect, classify and annotate a single image.

mod annotate;
mod loader;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use log::{debug, warn};

pub use self::annotate::{draw_faces, STROKE_COLOR, STROKE_WIDTH};
pub use self::loader::{load_for_detection, load_for_display, DETECTION_FORMATS};

use crate::common::{BoundingBox, RasterImage};
use crate::config::DetectorConfig;
use crate::detector::Detector;
use crate::error::{DetectError, StartupError};

/// Categorical result of processing one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    NoFaces,
    FacesFound,
    LoadFailed,
    ProcessingFailed,
}

impl Verdict {
    /// Result text shown to the user.
    pub fn summary(self) -> &'static str {
        match self {
            Verdict::NoFaces => "No human face detected.",
            Verdict::FacesFound => "Yes, human face(s) detected!",
            Verdict::LoadFailed => "Error reading image",
            Verdict::ProcessingFailed => "Error during processing",
        }
    }

    /// Whether detection ran to completion, with or without faces.
    pub fn is_success(self) -> bool {
        matches!(self, Verdict::NoFaces | Verdict::FacesFound)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// Everything a host needs to present the result of [`Pipeline::process`].
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    verdict: Verdict,
    image: Option<RasterImage>,
    faces: Vec<BoundingBox>,
    log: Vec<String>,
}

impl PipelineOutcome {
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Image to display: annotated when faces were found, the decoded
    /// original otherwise, `None` when nothing could be decoded.
    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    pub fn into_image(self) -> Option<RasterImage> {
        self.image
    }

    pub fn faces(&self) -> &[BoundingBox] {
        &self.faces
    }

    /// Diagnostic lines in the order the steps ran.
    pub fn log(&self) -> &[String] {
        &self.log
    }
}

/// Diagnostic trail of one request, mirrored to the `log` facade.
struct Trail {
    lines: Vec<String>,
}

impl Trail {
    fn new() -> Self {
        Trail { lines: Vec::new() }
    }

    fn push<S: Into<String>>(&mut self, line: S) {
        let line = line.into();
        debug!("{}", line);
        self.lines.push(line);
    }

    fn finish(
        mut self,
        verdict: Verdict,
        image: Option<RasterImage>,
        faces: Vec<BoundingBox>,
        name: &str,
    ) -> PipelineOutcome {
        if image.is_some() {
            self.push(format!("Image '{}' processed.", name));
        } else {
            self.push("No image data to display.");
        }

        PipelineOutcome {
            verdict,
            image,
            faces,
            log: self.lines,
        }
    }
}

/// Face detection pipeline over still image files.
///
/// Holds one detector for its whole lifetime; `process` takes `&self`, so a
/// pipeline can be shared between threads.
pub struct Pipeline {
    detector: Box<dyn Detector>,
}

impl Pipeline {
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Pipeline { detector }
    }

    /// Load the cascade at `path` and build a pipeline around it.
    pub fn from_cascade_path<P: AsRef<Path>>(
        path: P,
        config: DetectorConfig,
    ) -> Result<Self, StartupError> {
        let detector = crate::create_detector(path, config)?;
        Ok(Pipeline::new(detector))
    }

    pub fn detector(&self) -> &dyn Detector {
        self.detector.as_ref()
    }

    /// Process the image at `path`.
    ///
    /// Never fails: every problem is reported through the verdict and the
    /// diagnostic trail of the outcome.
    pub fn process<P: AsRef<Path>>(&self, path: P) -> PipelineOutcome {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut trail = Trail::new();
        trail.push("Processing image for face detection...");

        let image = match load_for_detection(path) {
            Ok(image) => image,
            Err(error) => {
                warn!("cannot read {}: {}", path.display(), error);
                trail.push(format!(
                    "Error: Could not read image. File might be corrupted or not an image. ({})",
                    error
                ));

                let fallback = match load_for_display(path) {
                    Ok(image) => Some(image),
                    Err(error) => {
                        trail.push(format!("Could not load image for display either: {}", error));
                        None
                    }
                };
                return trail.finish(Verdict::LoadFailed, fallback, Vec::new(), &name);
            }
        };

        let gray = image.to_grayscale();
        trail.push("Image converted to grayscale.");

        let faces = match self.run_detector(&gray) {
            Ok(faces) => faces,
            Err(error) => {
                warn!("detection failed on {}: {}", path.display(), error);
                trail.push(format!(
                    "Error during face detection or image processing: {}",
                    error
                ));
                trail.push("Displayed original image due to processing error.");
                return trail.finish(Verdict::ProcessingFailed, Some(image), Vec::new(), &name);
            }
        };

        trail.push(format!(
            "Face detection performed. Found {} potential face(s).",
            faces.len()
        ));

        if faces.is_empty() {
            trail.push("NO human face detected.");
            return trail.finish(Verdict::NoFaces, Some(image), faces, &name);
        }

        trail.push("Human face(s) DETECTED.");
        let annotated = draw_faces(&image, &faces);
        trail.push("Rectangles drawn on image.");
        trail.finish(Verdict::FacesFound, Some(annotated), faces, &name)
    }

    fn run_detector(&self, gray: &RasterImage) -> Result<Vec<BoundingBox>, DetectError> {
        let detector = self.detector.as_ref();
        let image = gray.as_image_data();
        panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&image)))
            .unwrap_or_else(|payload| Err(DetectError::Internal(panic_message(payload.as_ref()))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "detector panicked".to_string()
    }
}
