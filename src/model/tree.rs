//! Gradient-boosted regression tree ensembles.
//!
//! Ensembles are exported by the offline trainer as JSON:
//!
//! ```json
//! {
//!   "base_score": 0.5,
//!   "num_features": 9,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"id": 0, "feature": 0, "threshold": 17.5, "left": 1, "right": 2, "cover": 100},
//!         {"id": 1, "leaf": -1200.0, "cover": 60},
//!         {"id": 2, "leaf": 3400.0, "cover": 40}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A split routes `x[feature] < threshold` to `left` and everything else
//! (including NaN) to `right`. The prediction is `base_score` plus the sum of
//! the reached leaf of every tree.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("Tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("Tree {tree}: node ids must be dense and start at 0, found {id}")]
    SparseNodeIds { tree: usize, id: usize },

    #[error("Tree {tree}, node {node}: {reason}")]
    MalformedNode {
        tree: usize,
        node: usize,
        reason: String,
    },
}

#[derive(Deserialize)]
struct RawEnsemble {
    #[serde(default)]
    base_score: f64,
    num_features: usize,
    trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawTree {
    nodes: Vec<RawNode>,
}

#[derive(Deserialize)]
struct RawNode {
    id: usize,
    feature: Option<usize>,
    threshold: Option<f64>,
    left: Option<usize>,
    right: Option<usize>,
    leaf: Option<f64>,
    #[serde(default)]
    cover: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Training weight that reached this node.
    pub cover: f64,
}

impl Node {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize, cover: f64) -> Self {
        Node {
            kind: NodeKind::Split {
                feature,
                threshold,
                left,
                right,
            },
            cover,
        }
    }

    pub fn leaf(value: f64, cover: f64) -> Self {
        Node {
            kind: NodeKind::Leaf { value },
            cover,
        }
    }
}

/// A single regression tree. Node 0 is the root and every child index is
/// greater than its parent's, so traversal always terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Tree { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index].kind {
                NodeKind::Leaf { value } => return *value,
                NodeKind::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if x < *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Cover-weighted mean of the leaves: the tree's output when no feature
    /// is known.
    pub fn expected_value(&self) -> f64 {
        self.expected_value_at(0)
    }

    fn expected_value_at(&self, index: usize) -> f64 {
        let node = &self.nodes[index];
        match &node.kind {
            NodeKind::Leaf { value } => *value,
            NodeKind::Split { left, right, .. } => {
                let left_cover = self.nodes[*left].cover;
                let right_cover = self.nodes[*right].cover;
                (left_cover * self.expected_value_at(*left)
                    + right_cover * self.expected_value_at(*right))
                    / node.cover
            }
        }
    }

    fn validate(&self, tree: usize, num_features: usize) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::EmptyTree { tree });
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let malformed = |reason: String| TreeError::MalformedNode {
                tree,
                node: index,
                reason,
            };
            match &node.kind {
                NodeKind::Leaf { value } if !value.is_finite() => {
                    return Err(malformed(format!("leaf value {} is not finite", value)));
                }
                NodeKind::Leaf { .. } => {}
                NodeKind::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= num_features {
                        return Err(malformed(format!(
                            "feature {} out of range (model has {})",
                            feature, num_features
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(malformed(format!("invalid child {}", child)));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    base_score: f64,
    num_features: usize,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn new(base_score: f64, num_features: usize, trees: Vec<Tree>) -> Result<Self, TreeError> {
        for (index, tree) in trees.iter().enumerate() {
            tree.validate(index, num_features)?;
        }
        Ok(TreeEnsemble {
            base_score,
            num_features,
            trees,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ModelParseError> {
        let raw: RawEnsemble = serde_json::from_str(json)?;
        let mut trees = Vec::with_capacity(raw.trees.len());
        for (tree_index, raw_tree) in raw.trees.into_iter().enumerate() {
            trees.push(build_tree(tree_index, raw_tree)?);
        }
        Ok(TreeEnsemble::new(raw.base_score, raw.num_features, trees)?)
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.predict(features))
                .sum::<f64>()
    }

    pub fn expected_value(&self) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.expected_value())
                .sum::<f64>()
    }
}

#[derive(Debug, Error)]
pub enum ModelParseError {
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

fn build_tree(tree: usize, raw: RawTree) -> Result<Tree, TreeError> {
    let mut raw_nodes = raw.nodes;
    raw_nodes.sort_by_key(|n| n.id);

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (expected_id, raw_node) in raw_nodes.into_iter().enumerate() {
        if raw_node.id != expected_id {
            return Err(TreeError::SparseNodeIds {
                tree,
                id: raw_node.id,
            });
        }
        let kind = match (raw_node.leaf, raw_node.feature) {
            (Some(value), None) => NodeKind::Leaf { value },
            (None, Some(feature)) => {
                match (raw_node.threshold, raw_node.left, raw_node.right) {
                    (Some(threshold), Some(left), Some(right)) => NodeKind::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    },
                    _ => {
                        return Err(TreeError::MalformedNode {
                            tree,
                            node: raw_node.id,
                            reason: "split is missing threshold or children".to_string(),
                        })
                    }
                }
            }
            _ => {
                return Err(TreeError::MalformedNode {
                    tree,
                    node: raw_node.id,
                    reason: "node must be either a leaf or a split".to_string(),
                })
            }
        };
        nodes.push(Node {
            kind,
            cover: raw_node.cover,
        });
    }
    Ok(Tree::new(nodes))
}
