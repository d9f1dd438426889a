//! Runs the stock OpenCV frontal face cascade on a portrait.
//!
//! The assets are not bundled; place `haarcascade_frontalface_default.xml` and
//! a 400x400 portrait whose face fills the central 150x150 region under
//! `assets/test/`, then run with `cargo test -- --ignored`.

use facescan::{BoundingBox, DetectorConfig, Pipeline, Verdict};

const CASCADE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/test/haarcascade_frontalface_default.xml"
);
const PORTRAIT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/test/portrait_400.png");

#[test]
#[ignore]
fn finds_single_frontal_face() {
    let pipeline = Pipeline::from_cascade_path(CASCADE, DetectorConfig::default()).unwrap();
    let outcome = pipeline.process(PORTRAIT);

    assert_eq!(Verdict::FacesFound, outcome.verdict());
    assert_eq!(1, outcome.faces().len(), "{:?}", outcome.faces());

    let face = outcome.faces()[0];
    let region = BoundingBox::new(125, 125, 150, 150);
    let tolerance = 0.15 * 150.0;
    let center = |b: &BoundingBox| {
        (
            f64::from(b.x()) + f64::from(b.width()) / 2.0,
            f64::from(b.y()) + f64::from(b.height()) / 2.0,
        )
    };
    let (cx, cy) = center(&face);
    let (rx, ry) = center(&region);
    assert!((cx - rx).abs() <= tolerance && (cy - ry).abs() <= tolerance, "{:?}", face);
    assert!((f64::from(face.width()) - 150.0).abs() <= tolerance, "{:?}", face);
}
