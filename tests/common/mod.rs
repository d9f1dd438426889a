#![allow(dead_code)]

use std::path::{Path, PathBuf};

use facescan::{BoundingBox, DetectorConfig, Pipeline};
use image::{Rgb, RgbImage};

pub const CASCADE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/dark_square_cascade.xml");

pub const BACKGROUND: Rgb<u8> = Rgb([230, 230, 230]);
pub const SQUARE: Rgb<u8> = Rgb([20, 20, 20]);

/// Config sized for the 24x24 test cascade.
pub fn config(min_neighbors: u32) -> DetectorConfig {
    DetectorConfig::new(1.1, min_neighbors, (24, 24)).unwrap()
}

pub fn pipeline(min_neighbors: u32) -> Pipeline {
    Pipeline::from_cascade_path(CASCADE, config(min_neighbors)).unwrap()
}

pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// Light image with a dark square at each of `squares` (x, y, side).
pub fn squares_image(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = squares
            .iter()
            .any(|&(sx, sy, side)| x >= sx && x < sx + side && y >= sy && y < sy + side);
        if inside {
            SQUARE
        } else {
            BACKGROUND
        }
    })
}

/// Save `image` under `dir`; the format follows the extension of `name`.
pub fn save(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image
        .save(&path)
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {}", path.display(), e));
    path
}

/// Whether `(x, y)` lies within `stroke` pixels inside the edge of `face`.
pub fn on_border(face: &BoundingBox, x: u32, y: u32, stroke: u32) -> bool {
    let (x, y) = (x as i32, y as i32);
    let stroke = stroke as i32;
    face.contains_point(x, y)
        && (x < face.x() + stroke
            || y < face.y() + stroke
            || x >= face.right() - stroke
            || y >= face.bottom() - stroke)
}
