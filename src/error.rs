// This file is part of facescan, a still-image face detection and annotation library.
//
// As an open-source face detection library: you can redistribute facescan source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::io;
use std::path::PathBuf;

use image::ImageFormat;
use thiserror::Error;

/// Failure to load or parse a cascade model.
///
/// Raised only at startup; a process that cannot load its model must not
/// accept requests.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read cascade file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read cascade: {0}")]
    Read(#[from] io::Error),

    #[error("malformed cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("cascade is missing element <{0}>")]
    Missing(&'static str),

    #[error("invalid value for <{field}>: '{value}'")]
    Invalid { field: &'static str, value: String },

    #[error("unsupported cascade: {0}")]
    Unsupported(String),
}

/// Invalid detector sensitivity settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("scale factor must be greater than 1.0, got {0}")]
    InvalidScaleFactor(f64),

    #[error("minimum face size must be positive in both dimensions, got {0}x{1}")]
    InvalidMinSize(u32, u32),

    #[error("maximum face size {0}x{1} is smaller than the minimum face size")]
    InvalidMaxSize(u32, u32),
}

/// Everything that can stop a pipeline from being constructed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Input rejected by a detector.
#[derive(Debug, Error, PartialEq)]
pub enum DetectError {
    #[error("detector expects a single-channel image, got {0} channels")]
    NotGrayscale(u32),

    #[error("image dimensions are zero")]
    EmptyImage,

    #[error("image buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("detector failed: {0}")]
    Internal(String),
}

/// Failure to decode an input file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open image: {0}")]
    Io(#[from] io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported image format: {}", describe_format(.0))]
    UnsupportedFormat(Option<ImageFormat>),

    #[error("image dimensions are zero")]
    ZeroDimensions,
}

/// Raster buffer that does not match its declared shape.
#[derive(Debug, Error, PartialEq)]
pub enum RasterError {
    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("raster buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

fn describe_format(format: &Option<ImageFormat>) -> String {
    match format {
        Some(format) => format!("{:?}", format),
        None => "unknown".to_string(),
    }
}
