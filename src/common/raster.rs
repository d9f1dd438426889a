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

use image::{DynamicImage, GrayImage, RgbImage};

use super::ImageData;
use crate::error::RasterError;

// Rec.601 luma weights in 14-bit fixed point.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Interleaved 8-bit red, green, blue.
    Rgb,
    /// 8-bit luma.
    Gray,
}

impl PixelLayout {
    pub fn channels(self) -> u32 {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Gray => 1,
        }
    }
}

/// Owned, decoded image.
///
/// Dimensions are always positive and the buffer always holds exactly
/// `width * height * channels` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroDimensions);
        }

        let expected = width as usize * height as usize * layout.channels() as usize;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(RasterImage {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn from_rgb(image: RgbImage) -> Result<Self, RasterError> {
        let (width, height) = image.dimensions();
        RasterImage::new(width, height, PixelLayout::Rgb, image.into_raw())
    }

    pub fn from_gray(image: GrayImage) -> Result<Self, RasterError> {
        let (width, height) = image.dimensions();
        RasterImage::new(width, height, PixelLayout::Gray, image.into_raw())
    }

    /// Any decoded image, flattened to 8-bit RGB.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, RasterError> {
        RasterImage::from_rgb(image.into_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn num_channels(&self) -> u32 {
        self.layout.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn as_image_data(&self) -> ImageData<'_> {
        ImageData::with_channels(&self.data, self.width, self.height, self.num_channels())
    }

    /// Luma copy of the image; a gray image is returned as an identical copy.
    pub fn to_grayscale(&self) -> RasterImage {
        let data = match self.layout {
            PixelLayout::Gray => self.data.clone(),
            PixelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
        };

        RasterImage {
            width: self.width,
            height: self.height,
            layout: PixelLayout::Gray,
            data,
        }
    }

    /// Copy of the image as an `image` crate RGB buffer, for drawing and encoding.
    pub fn to_rgb_image(&self) -> RgbImage {
        let data = match self.layout {
            PixelLayout::Rgb => self.data.clone(),
            PixelLayout::Gray => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
        };
        // the buffer length is an invariant of RasterImage
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// RGB copy of the image with `edit` applied to its pixels.
    ///
    /// The canvas cannot change size, so the result keeps the dimensions of
    /// `self`.
    pub fn edit_rgb<F>(&self, edit: F) -> RasterImage
    where
        F: FnOnce(&mut RgbImage),
    {
        let mut canvas = self.to_rgb_image();
        edit(&mut canvas);

        RasterImage {
            width: self.width,
            height: self.height,
            layout: PixelLayout::Rgb,
            data: canvas.into_raw(),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self.layout {
            PixelLayout::Rgb => DynamicImage::ImageRgb8(self.to_rgb_image()),
            PixelLayout::Gray => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .unwrap_or_else(|| DynamicImage::new_luma8(self.width, self.height)),
        }
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .finish()
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((y + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_buffer_length() {
        assert_eq!(
            Err(RasterError::BufferSize {
                expected: 12,
                actual: 11
            }),
            RasterImage::new(2, 2, PixelLayout::Rgb, vec![0; 11])
        );
        assert_eq!(
            Err(RasterError::ZeroDimensions),
            RasterImage::new(0, 2, PixelLayout::Gray, vec![])
        );
        assert!(RasterImage::new(2, 2, PixelLayout::Gray, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(0, luma(0, 0, 0));
        assert_eq!(255, luma(255, 255, 255));
        assert_eq!(76, luma(255, 0, 0));
        assert_eq!(150, luma(0, 255, 0));
        assert_eq!(29, luma(0, 0, 255));
    }

    #[test]
    fn test_to_grayscale_keeps_original() {
        let rgb = RasterImage::new(2, 1, PixelLayout::Rgb, vec![255, 0, 0, 10, 10, 10]).unwrap();
        let gray = rgb.to_grayscale();
        assert_eq!(PixelLayout::Gray, gray.layout());
        assert_eq!(&[76u8, 10][..], gray.data());
        assert_eq!(PixelLayout::Rgb, rgb.layout());
        assert_eq!(6, rgb.data().len());
    }

    #[test]
    fn test_gray_expands_to_rgb() {
        let gray = RasterImage::new(2, 1, PixelLayout::Gray, vec![3, 9]).unwrap();
        assert_eq!(vec![3, 3, 3, 9, 9, 9], gray.to_rgb_image().into_raw());
    }

    #[test]
    fn test_edit_rgb_keeps_shape() {
        let gray = RasterImage::new(3, 2, PixelLayout::Gray, vec![7; 6]).unwrap();
        let edited = gray.edit_rgb(|canvas| canvas.put_pixel(2, 1, image::Rgb([1, 2, 3])));

        assert_eq!(PixelLayout::Rgb, edited.layout());
        assert_eq!((3, 2), (edited.width(), edited.height()));
        assert_eq!(18, edited.data().len());
        assert_eq!(&[7u8, 7, 7][..], &edited.data()[..3]);
        assert_eq!(&[1u8, 2, 3][..], &edited.data()[15..]);
        assert_eq!(PixelLayout::Gray, gray.layout());
    }

    #[test]
    fn test_image_data_view() {
        let rgb = RasterImage::new(3, 2, PixelLayout::Rgb, vec![1; 18]).unwrap();
        let view = rgb.as_image_data();
        assert_eq!(3, view.num_channels());
        assert_eq!((3, 2), (view.width(), view.height()));
        assert_eq!(1, rgb.to_grayscale().as_image_data().num_channels());
    }
}
