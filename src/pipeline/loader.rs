// This file is part of facescan, a still-image face detection and annotation library.
//
// As an open-source face detection library: you can redistribute facescan source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.


//! Image decoding for the pipeline.
//!
//! Detection only ever sees images from [`load_for_detection`], which accepts
//! a fixed set of containers identified by their content. [`load_for_display`]
//! takes anything the `image` crate can decode and is used only to show the
//! user what failed to load.

use std::fs;
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::common::RasterImage;
use crate::error::LoadError;

/// Containers accepted for detection.
pub const DETECTION_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Gif,
];

/// Decode `path` as an RGB image for detection.
///
/// The format is sniffed from the file content, never from the extension.
/// Animated GIFs yield their first frame. An EXIF orientation tag is applied,
/// so the image comes back upright.
pub fn load_for_detection(path: &Path) -> Result<RasterImage, LoadError> {
    let bytes = fs::read(path)?;

    let format = image::guess_format(&bytes).ok();
    let format = match format {
        Some(format) if DETECTION_FORMATS.contains(&format) => format,
        other => return Err(LoadError::UnsupportedFormat(other)),
    };

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format);
    to_raster(decode_upright(reader)?)
}

/// Decode `path` with every decoder available, for display only.
///
/// Falls back to the file extension when the content is not recognised and
/// lifts the decoder memory limits.
pub fn load_for_display(path: &Path) -> Result<RasterImage, LoadError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.no_limits();
    to_raster(decode_upright(reader)?)
}

fn decode_upright<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<DynamicImage, LoadError> {
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

fn to_raster(image: DynamicImage) -> Result<RasterImage, LoadError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(LoadError::ZeroDimensions);
    }
    RasterImage::from_dynamic(image).map_err(|_| LoadError::ZeroDimensions)
}
