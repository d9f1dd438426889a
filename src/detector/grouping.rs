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

use crate::common::BoundingBox;

/// Relative tolerance under which two candidate windows count as the same face.
pub const GROUP_EPS: f64 = 0.2;

/// Whether two candidates differ on every edge by at most `eps` times their
/// mean smaller side.
#[inline]
fn similar(a: &BoundingBox, b: &BoundingBox, eps: f64) -> bool {
    let delta = eps
        * (f64::from(a.width().min(b.width())) + f64::from(a.height().min(b.height())))
        * 0.5;
    let close = |p: i32, q: i32| f64::from((p - q).abs()) <= delta;

    close(a.x(), b.x()) && close(a.y(), b.y()) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

/// Equivalence classes of the transitive closure of `similar`.
///
/// Labels are numbered in order of first appearance.
fn partition(rects: &[BoundingBox], eps: f64) -> (Vec<usize>, usize) {
    let mut parent: Vec<usize> = (0..rects.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                let root_i = find(&mut parent, i);
                let root_j = find(&mut parent, j);
                if root_i != root_j {
                    parent[root_i.max(root_j)] = root_i.min(root_j);
                }
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; rects.len()];
    let mut num_classes = 0;
    let mut labels = Vec::with_capacity(rects.len());
    for i in 0..rects.len() {
        let root = find(&mut parent, i);
        if class_of_root[root] == usize::MAX {
            class_of_root[root] = num_classes;
            num_classes += 1;
        }
        labels.push(class_of_root[root]);
    }

    (labels, num_classes)
}

/// Merge overlapping candidate windows into faces.
///
/// A cluster survives only if more than `group_threshold` candidates fell
/// into it, i.e. a window needs at least `group_threshold` agreeing
/// neighbours. Surviving clusters nested inside a better supported cluster
/// are dropped. With `group_threshold == 0` the candidates are returned as is.
pub fn group_rectangles(rects: &[BoundingBox], group_threshold: u32, eps: f64) -> Vec<BoundingBox> {
    if group_threshold == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let (labels, num_classes) = partition(rects, eps);

    let mut sums = vec![[0.0f64; 4]; num_classes];
    let mut counts = vec![0u32; num_classes];
    for (rect, &label) in rects.iter().zip(labels.iter()) {
        let sum = &mut sums[label];
        sum[0] += f64::from(rect.x());
        sum[1] += f64::from(rect.y());
        sum[2] += f64::from(rect.width());
        sum[3] += f64::from(rect.height());
        counts[label] += 1;
    }

    let clusters: Vec<BoundingBox> = sums
        .iter()
        .zip(counts.iter())
        .map(|(sum, &n)| {
            let s = 1.0 / f64::from(n);
            BoundingBox::new(
                (sum[0] * s).round() as i32,
                (sum[1] * s).round() as i32,
                (sum[2] * s).round() as u32,
                (sum[3] * s).round() as u32,
            )
        })
        .collect();

    let mut faces = Vec::new();
    for (i, r1) in clusters.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= group_threshold {
            continue;
        }

        let nested = clusters.iter().enumerate().any(|(j, r2)| {
            let n2 = counts[j];
            if j == i || n2 <= group_threshold {
                return false;
            }
            let dx = (f64::from(r2.width()) * eps).round() as i32;
            let dy = (f64::from(r2.height()) * eps).round() as i32;

            r1.x() >= r2.x() - dx
                && r1.y() >= r2.y() - dy
                && r1.right() <= r2.right() + dx
                && r1.bottom() <= r2.bottom() + dy
                && (n2 > n1.max(3) || n1 < 3)
        });

        if !nested {
            faces.push(*r1);
        }
    }
    faces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jittered(x: i32, y: i32, size: u32, n: i32) -> Vec<BoundingBox> {
        (0..n)
            .map(|i| BoundingBox::new(x + i % 3 - 1, y + i % 2, size + (i % 3) as u32, size))
            .collect()
    }

    #[test]
    fn test_no_grouping_without_threshold() {
        let rects = jittered(10, 10, 40, 5);
        assert_eq!(rects, group_rectangles(&rects, 0, GROUP_EPS));
    }

    #[test]
    fn test_cluster_is_averaged_and_singletons_dropped() {
        let mut rects = vec![
            BoundingBox::new(100, 100, 40, 40),
            BoundingBox::new(102, 100, 40, 40),
            BoundingBox::new(100, 102, 40, 40),
            BoundingBox::new(102, 102, 40, 40),
        ];
        rects.push(BoundingBox::new(300, 10, 30, 30));

        assert_eq!(
            vec![BoundingBox::new(101, 101, 40, 40)],
            group_rectangles(&rects, 2, GROUP_EPS)
        );
    }

    #[test]
    fn test_cluster_needs_more_members_than_threshold() {
        let rects = jittered(50, 50, 40, 3);
        assert!(group_rectangles(&rects, 3, GROUP_EPS).is_empty());
        assert_eq!(1, group_rectangles(&rects, 2, GROUP_EPS).len());
    }

    #[test]
    fn test_similarity_is_transitive() {
        // each step is within tolerance of the previous, the ends are not
        let rects: Vec<BoundingBox> = (0..10).map(|i| BoundingBox::new(i * 6, 0, 40, 40)).collect();
        assert!(!similar(&rects[0], &rects[9], GROUP_EPS));
        let (labels, num_classes) = partition(&rects, GROUP_EPS);
        assert_eq!(1, num_classes);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_clusters_keep_first_appearance_order() {
        let mut rects = jittered(300, 300, 50, 4);
        rects.extend(jittered(10, 10, 50, 4));
        let faces = group_rectangles(&rects, 1, GROUP_EPS);
        assert_eq!(2, faces.len());
        assert!(faces[0].x() > faces[1].x());
    }

    #[test]
    fn test_nested_weak_cluster_is_dropped() {
        let mut rects = jittered(100, 100, 100, 8);
        rects.extend(jittered(130, 130, 30, 3));
        let faces = group_rectangles(&rects, 2, GROUP_EPS);
        assert_eq!(1, faces.len());
        assert!(faces[0].width() >= 100);
    }
}
