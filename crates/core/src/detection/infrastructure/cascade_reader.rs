//! Reader for OpenCV cascade XML (the format written by
//! `opencv_traincascade` and shipped as `haarcascade_*.xml`).
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::haar_cascade::{
    CascadeError, HaarCascade, HaarFeature, Stage, TreeNode, WeakTree, WeightedRect,
};

/// Values per internal node for non-categorical features:
/// `left right featureIdx threshold`.
const NODE_FIELDS: usize = 4;

/// Parses a new-style `BOOST`/`HAAR` cascade document.
pub fn parse_cascade(xml: &str) -> Result<HaarCascade, CascadeError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let cascade = match child(root, "cascade") {
        Some(node) => node,
        None if is_legacy(root) => return Err(CascadeError::LegacyFormat),
        None => return Err(CascadeError::MissingElement("cascade")),
    };

    let stage_type = required_text(cascade, "stageType")?;
    if stage_type != "BOOST" {
        return Err(CascadeError::UnsupportedStageType(stage_type.to_string()));
    }
    let feature_type = required_text(cascade, "featureType")?;
    if feature_type != "HAAR" {
        return Err(CascadeError::UnsupportedFeatureType(feature_type.to_string()));
    }
    if let Some(cats) = child(cascade, "featureParams").and_then(|p| child(p, "maxCatCount")) {
        let max_cat: i32 = parse_number("maxCatCount", cats.text().unwrap_or("0"))?;
        if max_cat > 0 {
            return Err(CascadeError::UnsupportedFeatureType("categorical HAAR".into()));
        }
    }

    let width: u32 = parse_number("width", required_text(cascade, "width")?)?;
    let height: u32 = parse_number("height", required_text(cascade, "height")?)?;

    let stages = elements(required(cascade, "stages")?)
        .map(parse_stage)
        .collect::<Result<Vec<_>, _>>()?;
    let features = elements(required(cascade, "features")?)
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(declared) = child(cascade, "stageNum").and_then(|n| n.text()) {
        let declared: usize = parse_number("stageNum", declared)?;
        if declared != stages.len() {
            return Err(CascadeError::Inconsistent(format!(
                "stageNum is {declared} but {} stages are present",
                stages.len()
            )));
        }
    }

    HaarCascade::new(width, height, stages, features)
}

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold = parse_number("stageThreshold", required_text(node, "stageThreshold")?)?;
    let trees = elements(required(node, "weakClassifiers")?)
        .map(parse_tree)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage { threshold, trees })
}

fn parse_tree(node: Node<'_, '_>) -> Result<WeakTree, CascadeError> {
    let raw = split(required_text(node, "internalNodes")?);
    if raw.is_empty() || raw.len() % NODE_FIELDS != 0 {
        return Err(CascadeError::Inconsistent(format!(
            "internalNodes has {} values, expected a multiple of {NODE_FIELDS}",
            raw.len()
        )));
    }
    let nodes = raw
        .chunks_exact(NODE_FIELDS)
        .map(|v| {
            let feature: i32 = parse_number("internalNodes", v[2])?;
            if feature < 0 {
                return Err(CascadeError::Inconsistent(format!("negative feature index {feature}")));
            }
            Ok(TreeNode {
                left: parse_number("internalNodes", v[0])?,
                right: parse_number("internalNodes", v[1])?,
                feature: feature as usize,
                threshold: parse_number("internalNodes", v[3])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let leaves = split(required_text(node, "leafValues")?)
        .into_iter()
        .map(|v| parse_number("leafValues", v))
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(WeakTree { nodes, leaves })
}

fn parse_feature(node: Node<'_, '_>) -> Result<HaarFeature, CascadeError> {
    let rects = elements(required(node, "rects")?)
        .map(|r| {
            let values = split(r.text().unwrap_or(""));
            if values.len() != 5 {
                return Err(CascadeError::Inconsistent(format!(
                    "feature rectangle has {} values, expected 5",
                    values.len()
                )));
            }
            Ok(WeightedRect {
                x: parse_number("rects", values[0])?,
                y: parse_number("rects", values[1])?,
                width: parse_number("rects", values[2])?,
                height: parse_number("rects", values[3])?,
                weight: parse_number("rects", values[4])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tilted = match child(node, "tilted").and_then(|t| t.text()) {
        Some(text) => parse_number::<i32>("tilted", text)? != 0,
        None => false,
    };

    Ok(HaarFeature { rects, tilted })
}

/// Pre-2.4 files put the classifier directly under the root with
/// `type_id="opencv-haar-classifier"`.
fn is_legacy(root: Node<'_, '_>) -> bool {
    elements(root).any(|n| n.attribute("type_id") == Some("opencv-haar-classifier"))
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn required<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, CascadeError> {
    child(node, name).ok_or(CascadeError::MissingElement(name))
}

fn required_text<'a>(node: Node<'a, '_>, name: &'static str) -> Result<&'a str, CascadeError> {
    required(node, name)?
        .text()
        .map(str::trim)
        .ok_or(CascadeError::MissingElement(name))
}

fn split(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, CascadeError> {
    value.trim().parse().map_err(|_| CascadeError::Number {
        field,
        value: value.trim().to_string(),
    })
}
