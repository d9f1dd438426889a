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

use crate::common::ImageData;
use crate::feat::FeatureMap;
use crate::math;

/// Integral and squared-integral images of one pyramid level.
pub struct HaarFeatureMap {
    width: u32,
    height: u32,
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl FeatureMap for HaarFeatureMap {
    fn compute(&mut self, image: &ImageData) {
        let width = image.width() as usize;
        let height = image.height() as usize;

        self.width = image.width();
        self.height = image.height();
        self.stride = width + 1;
        math::integral(image.data(), width, height, &mut self.sum);
        math::squared_integral(image.data(), width, height, &mut self.sq_sum);
    }
}

impl Default for HaarFeatureMap {
    fn default() -> Self {
        HaarFeatureMap::new()
    }
}

impl HaarFeatureMap {
    #[inline]
    pub fn new() -> Self {
        HaarFeatureMap {
            width: 0,
            height: 0,
            stride: 1,
            sum: vec![0],
            sq_sum: vec![0],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel sum over a rectangle given in image coordinates.
    #[inline]
    pub fn rect_sum(&self, x: u32, y: u32, width: u32, height: u32) -> u64 {
        math::rect_sum(
            &self.sum,
            self.stride,
            x as usize,
            y as usize,
            width as usize,
            height as usize,
        )
    }

    /// Contrast normalisation for a window: `sqrt(area * sum(v^2) - sum(v)^2)`
    /// over the given rectangle, or `1.0` for a flat region.
    pub fn variance_norm_factor(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        let (x, y, w, h) = (x as usize, y as usize, width as usize, height as usize);
        let area = (w * h) as f64;
        let sum = math::rect_sum(&self.sum, self.stride, x, y, w, h) as f64;
        let sq_sum = math::rect_sum(&self.sq_sum, self.stride, x, y, w, h) as f64;

        let nf = area * sq_sum - sum * sum;
        if nf > 0.0 {
            nf.sqrt()
        } else {
            1.0
        }
    }
}
