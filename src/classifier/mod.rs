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

mod haar_classifier;

pub use self::haar_classifier::{HaarCascade, HaarFeature, HaarRect, Stage, TreeNode, WeakClassifier};

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum ClassifierKind {
    Haar,
    Lbp,
    Hog,
}

impl ClassifierKind {
    /// Parse the `featureType` of a cascade file.
    #[inline]
    pub fn from(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "HAAR" => Some(ClassifierKind::Haar),
            "LBP" => Some(ClassifierKind::Lbp),
            "HOG" => Some(ClassifierKind::Hog),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    positive: bool,
    score: f64,
    stages_passed: usize,
}

impl Score {
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Sum of the last stage evaluated.
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn stages_passed(&self) -> usize {
        self.stages_passed
    }
}

#[cfg(test)]
mod tests {
    use super::ClassifierKind;

    #[test]
    fn test_kind_from_feature_type() {
        assert_eq!(Some(ClassifierKind::Haar), ClassifierKind::from("HAAR"));
        assert_eq!(Some(ClassifierKind::Lbp), ClassifierKind::from(" lbp "));
        assert_eq!(None, ClassifierKind::from("SURF"));
    }
}
