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

use std::fmt;

use super::Seq;

/// Borrowed view of a row-major image buffer.
#[derive(Clone, Copy)]
pub struct ImageData<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    num_channels: u32,
}

impl<'a> ImageData<'a> {
    /// Single-channel view of `data`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        ImageData::with_channels(data, width, height, 1)
    }

    pub fn with_channels(data: &'a [u8], width: u32, height: u32, num_channels: u32) -> Self {
        ImageData {
            data,
            width,
            height,
            num_channels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn num_channels(&self) -> u32 {
        self.num_channels
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> fmt::Debug for ImageData<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("num_channels", &self.num_channels)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One level of the pyramid.
pub struct ScaledImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl ScaledImage {
    pub fn as_image_data(&self) -> ImageData<'_> {
        ImageData::new(&self.data, self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Successively downscaled copies of a gray image, walked by a fixed-size
/// detection window.
///
/// Level `k` shrinks the image by `scale_step^k`, which is equivalent to
/// growing the window by the same factor on the original image.
pub struct ImagePyramid<'a> {
    image_1x: ImageData<'a>,
    window_width: u32,
    window_height: u32,
    scale_step: f64,
    min_window: (u32, u32),
    max_window: Option<(u32, u32)>,
}

impl<'a> ImagePyramid<'a> {
    pub fn new(image: ImageData<'a>, window_width: u32, window_height: u32) -> Self {
        ImagePyramid {
            image_1x: image,
            window_width,
            window_height,
            scale_step: 1.1,
            min_window: (0, 0),
            max_window: None,
        }
    }

    pub fn set_scale_step(&mut self, scale_step: f64) {
        if scale_step > 1.0 {
            self.scale_step = scale_step;
        }
    }

    /// Levels whose window maps to less than this size are skipped.
    pub fn set_min_window(&mut self, width: u32, height: u32) {
        self.min_window = (width, height);
    }

    /// The walk stops at the first level whose window maps to more than this size.
    pub fn set_max_window(&mut self, max_window: Option<(u32, u32)>) {
        self.max_window = max_window;
    }

    /// Scale factors of every level to be searched, smallest first.
    pub fn scales(&self) -> Vec<f64> {
        let width = f64::from(self.image_1x.width());
        let height = f64::from(self.image_1x.height());
        let (win_w, win_h) = (self.window_width, self.window_height);
        let (min_w, min_h) = self.min_window;
        let max_window = self.max_window;
        let step = self.scale_step;

        Seq::new(1.0f64, move |factor| factor * step)
            .take_while(move |factor| {
                let scaled_w = (width / factor).round() as u32;
                let scaled_h = (height / factor).round() as u32;
                scaled_w > win_w && scaled_h > win_h
            })
            .take_while(move |factor| match max_window {
                Some((max_w, max_h)) => {
                    let (w, h) = window_at(win_w, win_h, *factor);
                    w <= max_w && h <= max_h
                }
                None => true,
            })
            .filter(move |factor| {
                let (w, h) = window_at(win_w, win_h, *factor);
                w >= min_w && h >= min_h
            })
            .collect()
    }

    /// Size of the detection window on the original image at `factor`.
    pub fn window_size(&self, factor: f64) -> (u32, u32) {
        window_at(self.window_width, self.window_height, factor)
    }

    pub fn scaled_image(&self, factor: f64) -> ScaledImage {
        let width = ((f64::from(self.image_1x.width()) / factor).round() as u32).max(1);
        let height = ((f64::from(self.image_1x.height()) / factor).round() as u32).max(1);

        ScaledImage {
            data: resize_image(&self.image_1x, width, height),
            width,
            height,
        }
    }
}

fn window_at(width: u32, height: u32, factor: f64) -> (u32, u32) {
    (
        (f64::from(width) * factor).round() as u32,
        (f64::from(height) * factor).round() as u32,
    )
}

/// Bilinear resize of a single-channel image, sampling at pixel centers.
pub fn resize_image(src: &ImageData, width: u32, height: u32) -> Vec<u8> {
    if src.width() == width && src.height() == height {
        return src.data().to_vec();
    }

    let src_data = src.data();
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;

    let x_scale = src_width as f64 / f64::from(width);
    let y_scale = src_height as f64 / f64::from(height);

    let columns: Vec<(usize, usize, f64)> = (0..width)
        .map(|x| sample_coords(x, x_scale, src_width))
        .collect();

    let mut dest = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let (y0, y1, weight_y) = sample_coords(y, y_scale, src_height);
        let top = &src_data[y0 * src_width..(y0 + 1) * src_width];
        let bottom = &src_data[y1 * src_width..(y1 + 1) * src_width];

        for &(x0, x1, weight_x) in &columns {
            let d1 = f64::from(top[x0]);
            let d2 = f64::from(top[x1]);
            let d3 = f64::from(bottom[x0]);
            let d4 = f64::from(bottom[x1]);

            let value = (1.0 - weight_y) * ((1.0 - weight_x) * d1 + weight_x * d2)
                + weight_y * ((1.0 - weight_x) * d3 + weight_x * d4);

            dest.push((value + 0.5).clamp(0.0, 255.0) as u8);
        }
    }
    dest
}

#[inline]
fn sample_coords(index: u32, scale: f64, len: usize) -> (usize, usize, f64) {
    let pos = ((f64::from(index) + 0.5) * scale - 0.5).max(0.0);
    let i0 = (pos as usize).min(len - 1);
    let i1 = (i0 + 1).min(len - 1);
    (i0, i1, (pos - i0 as f64).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_identity_copies() {
        let data: Vec<u8> = (0..12).collect();
        let image = ImageData::new(&data, 4, 3);
        assert_eq!(data, resize_image(&image, 4, 3));
    }

    #[test]
    fn test_resize_constant_stays_constant() {
        let data = vec![77u8; 50 * 40];
        let image = ImageData::new(&data, 50, 40);
        let resized = resize_image(&image, 17, 23);
        assert_eq!(17 * 23, resized.len());
        assert!(resized.iter().all(|&v| v == 77));
    }

    #[test]
    fn test_resize_halves_checkerboard_to_mid_gray() {
        let data: Vec<u8> = (0..16)
            .map(|i| if (i % 4 + i / 4) % 2 == 0 { 0 } else { 200 })
            .collect();
        let image = ImageData::new(&data, 4, 4);
        let resized = resize_image(&image, 2, 2);
        assert!(resized.iter().all(|&v| v == 100), "{:?}", resized);
    }

    #[test]
    fn test_resize_single_column() {
        let data = vec![10u8, 20, 30];
        let image = ImageData::new(&data, 1, 3);
        let resized = resize_image(&image, 2, 3);
        assert_eq!(vec![10, 10, 20, 20, 30, 30], resized);
    }

    #[test]
    fn test_scales_stop_before_window_outgrows_image() {
        let data = vec![0u8; 100 * 100];
        let mut pyramid = ImagePyramid::new(ImageData::new(&data, 100, 100), 24, 24);
        pyramid.set_scale_step(2.0);
        // 100/1, 100/2 = 50 and 100/4 = 25 are wider than the window, 100/8 is not.
        assert_eq!(vec![1.0, 2.0, 4.0], pyramid.scales());
    }

    #[test]
    fn test_scales_respect_min_and_max_window() {
        let data = vec![0u8; 400 * 400];
        let mut pyramid = ImagePyramid::new(ImageData::new(&data, 400, 400), 24, 24);
        pyramid.set_scale_step(2.0);
        pyramid.set_min_window(40, 40);
        pyramid.set_max_window(Some((100, 100)));
        // windows of 24, 48, 96, 192 pixels
        assert_eq!(vec![2.0, 4.0], pyramid.scales());
        assert_eq!((96, 96), pyramid.window_size(4.0));
    }

    #[test]
    fn test_invalid_scale_step_is_ignored() {
        let data = vec![0u8; 64 * 64];
        let mut pyramid = ImagePyramid::new(ImageData::new(&data, 64, 64), 24, 24);
        pyramid.set_scale_step(0.5);
        assert_eq!(1.1, pyramid.scale_step);
    }

    #[test]
    fn test_scaled_image_dimensions() {
        let data = vec![5u8; 90 * 60];
        let pyramid = ImagePyramid::new(ImageData::new(&data, 90, 60), 24, 24);
        let scaled = pyramid.scaled_image(3.0);
        assert_eq!((30, 20), (scaled.width(), scaled.height()));
        assert_eq!(600, scaled.as_image_data().data().len());
    }
}
