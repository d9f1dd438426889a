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

use super::Score;
use crate::feat::HaarFeatureMap;

/// Weighted rectangle of a Haar-like feature, relative to the window origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaarRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HaarFeature {
    rects: Vec<HaarRect>,
}

impl HaarFeature {
    pub fn new(rects: Vec<HaarRect>) -> Self {
        HaarFeature { rects }
    }

    pub fn rects(&self) -> &[HaarRect] {
        &self.rects
    }

    #[inline]
    fn evaluate(&self, map: &HaarFeatureMap, x: u32, y: u32) -> f64 {
        self.rects
            .iter()
            .map(|r| r.weight * map.rect_sum(x + r.x, y + r.y, r.width, r.height) as f64)
            .sum()
    }
}

/// Split node of a weak classifier tree.
///
/// Child indices greater than zero point at another node, others at leaf `-child`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeakClassifier {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

impl WeakClassifier {
    pub fn new(nodes: Vec<TreeNode>, leaves: Vec<f64>) -> Self {
        WeakClassifier { nodes, leaves }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn leaves(&self) -> &[f64] {
        &self.leaves
    }

    #[inline]
    fn evaluate(&self, features: &[HaarFeature], map: &HaarFeatureMap, x: u32, y: u32, nf: f64) -> f64 {
        let mut index = 0usize;
        loop {
            let node = &self.nodes[index];
            let value = features[node.feature].evaluate(map, x, y) / nf;
            let next = if value < node.threshold {
                node.left
            } else {
                node.right
            };

            if next > 0 {
                index = next as usize;
            } else {
                return self.leaves[(-next) as usize];
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    threshold: f64,
    weak_classifiers: Vec<WeakClassifier>,
}

impl Stage {
    pub fn new(threshold: f64, weak_classifiers: Vec<WeakClassifier>) -> Self {
        Stage {
            threshold,
            weak_classifiers,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn weak_classifiers(&self) -> &[WeakClassifier] {
        &self.weak_classifiers
    }
}

/// Boosted cascade of Haar-like features over a fixed-size window.
///
/// Structural soundness (node links, feature indices, rectangles inside the
/// window) is checked when a model is read, so evaluation does no bounds
/// validation of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn new(
        window_width: u32,
        window_height: u32,
        stages: Vec<Stage>,
        features: Vec<HaarFeature>,
    ) -> Self {
        HaarCascade {
            window_width,
            window_height,
            stages,
            features,
        }
    }

    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn features(&self) -> &[HaarFeature] {
        &self.features
    }

    /// Run the cascade on the window whose top-left corner is `(x, y)`.
    ///
    /// The window must lie inside the image the feature map was computed for.
    pub fn classify(&self, map: &HaarFeatureMap, x: u32, y: u32) -> Score {
        let nf = map.variance_norm_factor(
            x + 1,
            y + 1,
            self.window_width.saturating_sub(2).max(1),
            self.window_height.saturating_sub(2).max(1),
        );

        let mut score = 0.0;
        for (i, stage) in self.stages.iter().enumerate() {
            score = stage
                .weak_classifiers
                .iter()
                .map(|weak| weak.evaluate(&self.features, map, x, y, nf))
                .sum();

            if score < stage.threshold {
                return Score {
                    positive: false,
                    score,
                    stages_passed: i,
                };
            }
        }

        Score {
            positive: true,
            score,
            stages_passed: self.stages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ImageData;
    use crate::feat::FeatureMap;

    // Responds to a window whose central quarter is darker than its whole.
    fn center_dark_cascade() -> HaarCascade {
        let feature = HaarFeature::new(vec![
            HaarRect { x: 0, y: 0, width: 24, height: 24, weight: -1.0 },
            HaarRect { x: 6, y: 6, width: 12, height: 12, weight: 4.0 },
        ]);
        let weak = WeakClassifier::new(
            vec![TreeNode { left: 0, right: -1, feature: 0, threshold: -0.1 }],
            vec![1.0, -1.0],
        );
        HaarCascade::new(24, 24, vec![Stage::new(0.0, vec![weak])], vec![feature])
    }

    fn feature_map(data: &[u8], width: u32, height: u32) -> HaarFeatureMap {
        let mut map = HaarFeatureMap::new();
        map.compute(&ImageData::new(data, width, height));
        map
    }

    #[test]
    fn test_flat_window_is_rejected() {
        let data = vec![200u8; 24 * 24];
        let score = center_dark_cascade().classify(&feature_map(&data, 24, 24), 0, 0);
        assert!(!score.is_positive());
        assert_eq!(0, score.stages_passed());
        assert_eq!(-1.0, score.score());
    }

    #[test]
    fn test_dark_center_is_accepted() {
        let data: Vec<u8> = (0..24 * 24)
            .map(|i| {
                let (x, y) = (i % 24, i / 24);
                if (6..18).contains(&x) && (6..18).contains(&y) {
                    0
                } else {
                    255
                }
            })
            .collect();
        let score = center_dark_cascade().classify(&feature_map(&data, 24, 24), 0, 0);
        assert!(score.is_positive());
        assert_eq!(1, score.stages_passed());
    }

    #[test]
    fn test_tree_walks_to_second_level() {
        // root: value < 1e9 always goes left to node 1, which always goes right to leaf 2
        let weak = WeakClassifier::new(
            vec![
                TreeNode { left: 1, right: 0, feature: 0, threshold: 1e9 },
                TreeNode { left: -1, right: -2, feature: 0, threshold: -1e9 },
            ],
            vec![0.0, 1.0, 2.0],
        );
        let feature = HaarFeature::new(vec![HaarRect { x: 0, y: 0, width: 2, height: 2, weight: 1.0 }]);
        let data = vec![1u8; 4 * 4];
        let map = feature_map(&data, 4, 4);
        assert_eq!(2.0, weak.evaluate(&[feature], &map, 0, 0, 1.0));
    }

    #[test]
    fn test_later_stage_rejection_reports_progress() {
        let mut cascade = center_dark_cascade();
        let always_reject = WeakClassifier::new(
            vec![TreeNode { left: 0, right: 0, feature: 0, threshold: 0.0 }],
            vec![-5.0],
        );
        cascade.stages.push(Stage::new(0.0, vec![always_reject]));

        let data: Vec<u8> = (0..24 * 24)
            .map(|i| if (6..18).contains(&(i % 24)) && (6..18).contains(&(i / 24)) { 0 } else { 255 })
            .collect();
        let score = cascade.classify(&feature_map(&data, 24, 24), 0, 0);
        assert!(!score.is_positive());
        assert_eq!(1, score.stages_passed());
        assert_eq!(-5.0, score.score());
    }
}
