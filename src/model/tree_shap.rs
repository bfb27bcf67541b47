//! Path-dependent TreeSHAP for [`TreeEnsemble`]s.
//!
//! Computes, for a single input row, the Shapley value of every feature with
//! respect to the cover-weighted expectation of the ensemble, in polynomial time
//! over the unique feature paths of each tree (Lundberg et al., "Consistent
//! Individualized Feature Attribution for Tree Ensembles", Algorithm 2).

use super::tree::{NodeKind, Tree, TreeEnsemble};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Per-feature contributions for `features`. The returned vector has one entry
/// per model input; `expected_value() + sum(result)` approximates `predict()`.
pub fn shap_values(model: &TreeEnsemble, features: &[f64]) -> Vec<f64> {
    let mut phi = vec![0.0; model.num_features()];
    for tree in model.trees() {
        let root = PathElement {
            feature: None,
            zero_fraction: 1.0,
            one_fraction: 1.0,
            weight: 1.0,
        };
        recurse(tree, features, &mut phi, 0, &[], 0, root);
    }
    phi
}

fn recurse(
    tree: &Tree,
    features: &[f64],
    phi: &mut [f64],
    node_index: usize,
    parent_path: &[PathElement],
    unique_depth: usize,
    incoming: PathElement,
) {
    let mut path: Vec<PathElement> = parent_path[..unique_depth].to_vec();
    extend_path(
        &mut path,
        unique_depth,
        incoming.zero_fraction,
        incoming.one_fraction,
        incoming.feature,
    );

    let node = tree.node(node_index);
    match &node.kind {
        NodeKind::Leaf { value } => {
            for i in 1..=unique_depth {
                let weight = unwound_path_sum(&path, unique_depth, i);
                let element = path[i];
                if let Some(feature) = element.feature {
                    phi[feature] +=
                        weight * (element.one_fraction - element.zero_fraction) * value;
                }
            }
        }
        NodeKind::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            let x = features.get(*feature).copied().unwrap_or(f64::NAN);
            let (hot, cold) = if x < *threshold {
                (*left, *right)
            } else {
                (*right, *left)
            };
            let hot_zero_fraction = tree.node(hot).cover / node.cover;
            let cold_zero_fraction = tree.node(cold).cover / node.cover;

            let mut incoming_zero_fraction = 1.0;
            let mut incoming_one_fraction = 1.0;
            let mut depth = unique_depth;

            // A feature already on the path is unwound and re-entered, so each
            // feature appears at most once.
            if let Some(path_index) = (1..=depth).find(|&i| path[i].feature == Some(*feature)) {
                incoming_zero_fraction = path[path_index].zero_fraction;
                incoming_one_fraction = path[path_index].one_fraction;
                unwind_path(&mut path, depth, path_index);
                depth -= 1;
            }

            recurse(
                tree,
                features,
                phi,
                hot,
                &path,
                depth + 1,
                PathElement {
                    feature: Some(*feature),
                    zero_fraction: hot_zero_fraction * incoming_zero_fraction,
                    one_fraction: incoming_one_fraction,
                    weight: 0.0,
                },
            );
            recurse(
                tree,
                features,
                phi,
                cold,
                &path,
                depth + 1,
                PathElement {
                    feature: Some(*feature),
                    zero_fraction: cold_zero_fraction * incoming_zero_fraction,
                    one_fraction: 0.0,
                    weight: 0.0,
                },
            );
        }
    }
}

fn extend_path(
    path: &mut Vec<PathElement>,
    unique_depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path.truncate(unique_depth);
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if unique_depth == 0 { 1.0 } else { 0.0 },
    });
    let denominator = (unique_depth + 1) as f64;
    for i in (0..unique_depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denominator;
        path[i].weight = zero_fraction * path[i].weight * (unique_depth - i) as f64 / denominator;
    }
}

fn unwind_path(path: &mut [PathElement], unique_depth: usize, path_index: usize) {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let denominator = (unique_depth + 1) as f64;
    let mut next_one_portion = path[unique_depth].weight;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denominator / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].weight * zero_fraction * (unique_depth - i) as f64 / denominator;
        } else {
            path[i].weight =
                path[i].weight * denominator / (zero_fraction * (unique_depth - i) as f64);
        }
    }

    for i in path_index..unique_depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

fn unwound_path_sum(path: &[PathElement], unique_depth: usize, path_index: usize) -> f64 {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let denominator = (unique_depth + 1) as f64;
    let mut next_one_portion = path[unique_depth].weight;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * denominator / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion =
                path[i].weight - tmp * zero_fraction * (unique_depth - i) as f64 / denominator;
        } else if zero_fraction != 0.0 {
            total += path[i].weight / zero_fraction / ((unique_depth - i) as f64 / denominator);
        }
    }
    total
}
