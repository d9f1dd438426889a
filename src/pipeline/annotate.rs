// This file is part of facescan, a still-image face detection and annotation library.
//
// As an open-source face detection library: you can redistribute facescan source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.


use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::common::{BoundingBox, RasterImage};

pub const STROKE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const STROKE_WIDTH: u32 = 2;

/// Copy of `image` with an outline drawn just inside every box.
///
/// Only pixels within `STROKE_WIDTH` of a box edge change.
pub fn draw_faces(image: &RasterImage, faces: &[BoundingBox]) -> RasterImage {
    image.edit_rgb(|canvas| {
        for face in faces {
            draw_outline(canvas, face);
        }
    })
}

fn draw_outline(canvas: &mut RgbImage, face: &BoundingBox) {
    for inset in 0..STROKE_WIDTH {
        let width = face.width().saturating_sub(2 * inset);
        let height = face.height().saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }

        let rect = Rect::at(face.x() + inset as i32, face.y() + inset as i32).of_size(width, height);
        draw_hollow_rect_mut(canvas, rect, STROKE_COLOR);
    }
}
