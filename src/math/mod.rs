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

//! Summed-area tables.
//!
//! Tables are `(width + 1) x (height + 1)` with a zero first row and column,
//! so the sum over any rectangle is four lookups without edge cases.

/// Integral image of `src` mapped through `f`, written into `dest`.
pub fn integral_with<F>(src: &[u8], width: usize, height: usize, dest: &mut Vec<u64>, f: F)
where
    F: Fn(u8) -> u64,
{
    assert_eq!(src.len(), width * height);

    let stride = width + 1;
    dest.clear();
    dest.resize(stride * (height + 1), 0);

    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let mut row_sum = 0u64;
        for (x, &value) in row.iter().enumerate() {
            row_sum += f(value);
            dest[(y + 1) * stride + x + 1] = dest[y * stride + x + 1] + row_sum;
        }
    }
}

pub fn integral(src: &[u8], width: usize, height: usize, dest: &mut Vec<u64>) {
    integral_with(src, width, height, dest, u64::from);
}

pub fn squared_integral(src: &[u8], width: usize, height: usize, dest: &mut Vec<u64>) {
    integral_with(src, width, height, dest, |v| u64::from(v) * u64::from(v));
}

/// Sum over the `w` x `h` rectangle at `(x, y)` of a table built for an image
/// `stride - 1` pixels wide.
#[inline]
pub fn rect_sum(table: &[u64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> u64 {
    let top = y * stride;
    let bottom = (y + h) * stride;
    (table[bottom + x + w] + table[top + x]) - (table[top + x + w] + table[bottom + x])
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_integral() {
        let src = vec![1, 2, 3, 4, 5, 6];
        let mut table = vec![];
        integral(&src, 3, 2, &mut table);
        assert_eq!(vec![0, 0, 0, 0, 0, 1, 3, 6, 0, 5, 12, 21], table);
    }

    #[test]
    fn test_squared_integral() {
        let src = vec![1, 2, 3, 4];
        let mut table = vec![];
        squared_integral(&src, 2, 2, &mut table);
        assert_eq!(vec![0, 0, 0, 0, 1, 5, 0, 10, 30], table);
    }

    #[test]
    fn test_rect_sum() {
        let src: Vec<u8> = (1..=16).collect();
        let mut table = vec![];
        integral(&src, 4, 4, &mut table);
        assert_eq!(136, rect_sum(&table, 5, 0, 0, 4, 4));
        // 6 + 7 + 10 + 11
        assert_eq!(34, rect_sum(&table, 5, 1, 1, 2, 2));
        assert_eq!(16, rect_sum(&table, 5, 3, 3, 1, 1));
    }

    #[test]
    fn test_integral_reuses_buffer() {
        let mut table = vec![99; 100];
        integral(&[7], 1, 1, &mut table);
        assert_eq!(vec![0, 0, 0, 7], table);
    }

    #[test]
    fn test_integral_does_not_overflow_large_bright_images() {
        let (width, height) = (2000, 1500);
        let src = vec![255u8; width * height];
        let mut table = vec![];
        squared_integral(&src, width, height, &mut table);
        assert_eq!(
            65025 * (width * height) as u64,
            rect_sum(&table, width + 1, 0, 0, width, height)
        );
    }
}
