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

use crate::error::ConfigError;

/// Detection sensitivity, fixed for the lifetime of a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    scale_factor: f64,
    min_neighbors: u32,
    min_size: (u32, u32),
    max_size: Option<(u32, u32)>,
}

impl DetectorConfig {
    pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
    pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;
    pub const DEFAULT_MIN_SIZE: (u32, u32) = (30, 30);

    /// `scale_factor` is the ratio between successive pyramid levels and must
    /// exceed 1.0; `min_neighbors` is the number of agreeing neighbouring
    /// windows a detection needs; `min_size` is the smallest face reported.
    pub fn new(
        scale_factor: f64,
        min_neighbors: u32,
        min_size: (u32, u32),
    ) -> Result<Self, ConfigError> {
        if !(scale_factor > 1.0) || !scale_factor.is_finite() {
            return Err(ConfigError::InvalidScaleFactor(scale_factor));
        }
        if min_size.0 == 0 || min_size.1 == 0 {
            return Err(ConfigError::InvalidMinSize(min_size.0, min_size.1));
        }

        Ok(DetectorConfig {
            scale_factor,
            min_neighbors,
            min_size,
            max_size: None,
        })
    }

    /// Limit the largest face reported.
    pub fn with_max_size(self, max_size: (u32, u32)) -> Result<Self, ConfigError> {
        if max_size.0 < self.min_size.0 || max_size.1 < self.min_size.1 {
            return Err(ConfigError::InvalidMaxSize(max_size.0, max_size.1));
        }
        Ok(DetectorConfig {
            max_size: Some(max_size),
            ..self
        })
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn min_neighbors(&self) -> u32 {
        self.min_neighbors
    }

    pub fn min_size(&self) -> (u32, u32) {
        self.min_size
    }

    pub fn max_size(&self) -> Option<(u32, u32)> {
        self.max_size
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            scale_factor: Self::DEFAULT_SCALE_FACTOR,
            min_neighbors: Self::DEFAULT_MIN_NEIGHBORS,
            min_size: Self::DEFAULT_MIN_SIZE,
            max_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_matches_frontal_face_settings() {
        let config = DetectorConfig::default();
        assert_eq!(1.1, config.scale_factor());
        assert_eq!(5, config.min_neighbors());
        assert_eq!((30, 30), config.min_size());
        assert_eq!(None, config.max_size());
        assert_eq!(Ok(config), DetectorConfig::new(1.1, 5, (30, 30)));
    }

    #[rstest]
    #[case(1.0)]
    #[case(0.8)]
    #[case(-2.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_rejects_non_growing_scale_factor(#[case] scale_factor: f64) {
        assert!(matches!(
            DetectorConfig::new(scale_factor, 5, (30, 30)),
            Err(ConfigError::InvalidScaleFactor(_))
        ));
    }

    #[rstest]
    #[case((0, 30))]
    #[case((30, 0))]
    fn test_rejects_empty_min_size(#[case] min_size: (u32, u32)) {
        assert_eq!(
            Err(ConfigError::InvalidMinSize(min_size.0, min_size.1)),
            DetectorConfig::new(1.2, 3, min_size)
        );
    }

    #[test]
    fn test_zero_neighbors_is_allowed() {
        assert_eq!(0, DetectorConfig::new(1.05, 0, (1, 1)).unwrap().min_neighbors());
    }

    #[test]
    fn test_max_size_must_hold_min_size() {
        let config = DetectorConfig::default();
        assert_eq!(
            Err(ConfigError::InvalidMaxSize(20, 200)),
            config.with_max_size((20, 200))
        );
        assert_eq!(
            Some((200, 200)),
            config.with_max_size((200, 200)).unwrap().max_size()
        );
    }
}
