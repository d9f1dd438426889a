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

use std::fs;
use std::io::Read;
use std::path::Path;

use log::info;
use roxmltree::{Document, Node};

use crate::classifier::{
    ClassifierKind, HaarCascade, HaarFeature, HaarRect, Stage, TreeNode, WeakClassifier,
};
use crate::error::ModelError;

/// Pre-trained cascade, immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    kind: ClassifierKind,
    cascade: HaarCascade,
}

impl Model {
    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    pub fn get_classifier(&self) -> &HaarCascade {
        &self.cascade
    }

    /// Size of the detection window the cascade was trained on.
    pub fn window_size(&self) -> (u32, u32) {
        (self.cascade.window_width(), self.cascade.window_height())
    }

    pub fn get_stage_count(&self) -> usize {
        self.cascade.stages().len()
    }

    pub fn get_feature_count(&self) -> usize {
        self.cascade.features().len()
    }
}

/// Load a cascade from an OpenCV cascade XML file
/// (as written by `opencv_traincascade`, e.g. `haarcascade_frontalface_default.xml`).
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model, ModelError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model = parse_model(&text)?;
    info!(
        "loaded cascade {}: {} stages, {} features, {}x{} window",
        path.display(),
        model.get_stage_count(),
        model.get_feature_count(),
        model.cascade.window_width(),
        model.cascade.window_height()
    );
    Ok(model)
}

/// Read a cascade in OpenCV cascade XML format from any reader.
pub fn read_model<R: Read>(mut reader: R) -> Result<Model, ModelError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_model(&text)
}

fn parse_model(text: &str) -> Result<Model, ModelError> {
    let document = Document::parse(text)?;
    ModelReader::new(&document).read()
}

struct ModelReader<'a, 'input> {
    root: Node<'a, 'input>,
}

impl<'a, 'input> ModelReader<'a, 'input> {
    fn new(document: &'a Document<'input>) -> Self {
        ModelReader {
            root: document.root_element(),
        }
    }

    fn read(self) -> Result<Model, ModelError> {
        let cascade = match element(self.root, "cascade") {
            Some(cascade) => cascade,
            None if is_legacy_format(self.root) => {
                return Err(ModelError::Unsupported(
                    "legacy opencv-haar-classifier format".to_string(),
                ))
            }
            None => return Err(ModelError::Missing("cascade")),
        };

        let stage_type = text(required(cascade, "stageType")?);
        if stage_type != "BOOST" {
            return Err(ModelError::Unsupported(format!("stage type {}", stage_type)));
        }

        let feature_type = text(required(cascade, "featureType")?);
        let kind = match ClassifierKind::from(feature_type) {
            Some(ClassifierKind::Haar) => ClassifierKind::Haar,
            Some(other) => {
                return Err(ModelError::Unsupported(format!("feature type {:?}", other)))
            }
            None => return Err(invalid("featureType", feature_type)),
        };

        if let Some(max_cat_count) = element(cascade, "featureParams")
            .and_then(|params| element(params, "maxCatCount"))
        {
            if parse_number::<u32>(max_cat_count, "maxCatCount")? != 0 {
                return Err(ModelError::Unsupported("categorical features".to_string()));
            }
        }

        let window_width: u32 = parse_number(required(cascade, "width")?, "width")?;
        let window_height: u32 = parse_number(required(cascade, "height")?, "height")?;
        if window_width < 3 {
            return Err(invalid("width", &window_width.to_string()));
        }
        if window_height < 3 {
            return Err(invalid("height", &window_height.to_string()));
        }

        let features = items(required(cascade, "features")?)
            .map(|node| read_feature(node, window_width, window_height))
            .collect::<Result<Vec<_>, _>>()?;

        let stages = items(required(cascade, "stages")?)
            .map(|node| read_stage(node, features.len()))
            .collect::<Result<Vec<_>, _>>()?;

        if stages.is_empty() {
            return Err(ModelError::Missing("stages/_"));
        }

        if let Some(stage_num) = element(cascade, "stageNum") {
            let declared: usize = parse_number(stage_num, "stageNum")?;
            if declared != stages.len() {
                return Err(invalid("stageNum", text(stage_num)));
            }
        }

        Ok(Model {
            kind,
            cascade: HaarCascade::new(window_width, window_height, stages, features),
        })
    }
}

fn read_stage(node: Node, num_features: usize) -> Result<Stage, ModelError> {
    let threshold: f64 = parse_number(required(node, "stageThreshold")?, "stageThreshold")?;

    let weak_classifiers = items(required(node, "weakClassifiers")?)
        .map(|weak| read_weak_classifier(weak, num_features))
        .collect::<Result<Vec<_>, _>>()?;

    if weak_classifiers.is_empty() {
        return Err(ModelError::Missing("weakClassifiers/_"));
    }

    Ok(Stage::new(threshold, weak_classifiers))
}

fn read_weak_classifier(node: Node, num_features: usize) -> Result<WeakClassifier, ModelError> {
    let internal = required(node, "internalNodes")?;
    let values = numbers(internal, "internalNodes")?;
    if values.is_empty() || values.len() % 4 != 0 {
        return Err(invalid("internalNodes", text(internal)));
    }

    let leaves = numbers(required(node, "leafValues")?, "leafValues")?;
    let num_nodes = values.len() / 4;

    let mut nodes = Vec::with_capacity(num_nodes);
    for (index, chunk) in values.chunks_exact(4).enumerate() {
        let left = chunk[0] as i32;
        let right = chunk[1] as i32;
        let feature = chunk[2];

        let links_ok = [left, right].iter().all(|&child| {
            if child > 0 {
                // children always come after their parent, which rules out cycles
                (child as usize) < num_nodes && child as usize > index
            } else {
                ((-child) as usize) < leaves.len()
            }
        });
        if !links_ok || feature < 0.0 || feature as usize >= num_features {
            return Err(invalid("internalNodes", text(internal)));
        }

        nodes.push(TreeNode {
            left,
            right,
            feature: feature as usize,
            threshold: chunk[3],
        });
    }

    Ok(WeakClassifier::new(nodes, leaves))
}

fn read_feature(node: Node, window_width: u32, window_height: u32) -> Result<HaarFeature, ModelError> {
    if let Some(tilted) = element(node, "tilted") {
        if parse_number::<u32>(tilted, "tilted")? != 0 {
            return Err(ModelError::Unsupported("tilted features".to_string()));
        }
    }

    let rects = items(required(node, "rects")?)
        .map(|rect| read_rect(rect, window_width, window_height))
        .collect::<Result<Vec<_>, _>>()?;

    if rects.is_empty() {
        return Err(ModelError::Missing("rects/_"));
    }

    Ok(HaarFeature::new(rects))
}

fn read_rect(node: Node, window_width: u32, window_height: u32) -> Result<HaarRect, ModelError> {
    let fields: Vec<&str> = text(node).split_whitespace().collect();
    if fields.len() != 5 {
        return Err(invalid("rects", text(node)));
    }

    let coord = |s: &str| s.parse::<u32>().map_err(|_| invalid("rects", text(node)));
    let rect = HaarRect {
        x: coord(fields[0])?,
        y: coord(fields[1])?,
        width: coord(fields[2])?,
        height: coord(fields[3])?,
        weight: fields[4]
            .parse::<f64>()
            .map_err(|_| invalid("rects", text(node)))?,
    };

    if rect.width == 0
        || rect.height == 0
        || rect.x.checked_add(rect.width).map_or(true, |right| right > window_width)
        || rect.y.checked_add(rect.height).map_or(true, |bottom| bottom > window_height)
    {
        return Err(invalid("rects", text(node)));
    }

    Ok(rect)
}

fn is_legacy_format(root: Node) -> bool {
    root.children()
        .filter(Node::is_element)
        .any(|node| node.attribute("type_id") == Some("opencv-haar-classifier"))
}

fn element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn required<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, ModelError> {
    element(node, name).ok_or(ModelError::Missing(name))
}

/// Sequence entries (`<_>` children) of a node.
fn items<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().name() == "_")
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or("")
}

fn parse_number<T: std::str::FromStr>(node: Node, field: &'static str) -> Result<T, ModelError> {
    let value = text(node);
    value.parse::<T>().map_err(|_| invalid(field, value))
}

fn numbers(node: Node, field: &'static str) -> Result<Vec<f64>, ModelError> {
    text(node)
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(|_| invalid(field, s)))
        .collect()
}

fn invalid(field: &'static str, value: &str) -> ModelError {
    ModelError::Invalid {
        field,
        value: value.to_string(),
    }
}
