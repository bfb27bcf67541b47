mod dual;
mod tree;
pub mod tree_shap;

pub use dual::{DualRegressor, RawPrediction, Target};
pub use tree::{ModelParseError, Node, NodeKind, Tree, TreeEnsemble, TreeError};
