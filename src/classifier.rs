//! The pretrained model boundary.
//!
//! The detector only needs something that maps rows to labels. Trained
//! models are shipped as JSON artifacts tagged by `kind`:
//!
//! ```json
//! { "kind": "decision_tree",
//!   "children_left":  [1, -1, -1],
//!   "children_right": [2, -1, -1],
//!   "feature":        [0, -2, -2],
//!   "threshold":      [100.0, -2.0, -2.0],
//!   "value":          [0.0, 0.0, 100.0] }
//! ```
//!
//! Node arrays follow the flat layout scikit-learn uses for its trees.

use std::fmt;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::{Row, CHANNEL_COUNT};
use crate::error::{FaultError, Result};

/// A trained classifier: one label per input row.
pub trait Classifier: fmt::Debug {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>>;
}

// ---------------------------------------------------------------------------
// Artifact loading
// ---------------------------------------------------------------------------

/// All model kinds this crate can deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    Linear(LinearModel),
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::DecisionTree(tree) => tree.validate(),
            ModelArtifact::RandomForest(forest) => forest.validate(),
            ModelArtifact::Linear(linear) => linear.validate(),
        }
    }

    fn describe(&self) -> String {
        match self {
            ModelArtifact::DecisionTree(tree) => format!("decision tree, {} nodes", tree.value.len()),
            ModelArtifact::RandomForest(forest) => format!("random forest, {} trees", forest.trees.len()),
            ModelArtifact::Linear(linear) => format!("linear, {} classes", linear.classes.len()),
        }
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
        match self {
            ModelArtifact::DecisionTree(tree) => tree.predict(rows),
            ModelArtifact::RandomForest(forest) => forest.predict(rows),
            ModelArtifact::Linear(linear) => linear.predict(rows),
        }
    }
}

/// Read and validate a JSON model artifact.
pub fn load_model(path: &Path) -> Result<Box<dyn Classifier>> {
    let text = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&text)?;
    artifact.validate()?;
    info!("Loaded model from {} ({})", path.display(), artifact.describe());
    Ok(Box::new(artifact))
}

// ---------------------------------------------------------------------------
// Decision tree
// ---------------------------------------------------------------------------

/// Flat binary tree. Node `i` is a leaf when `children_left[i] == -1`;
/// otherwise a row goes left when `row[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class label stored at each node; only leaves are read.
    pub value: Vec<f64>,
}

impl DecisionTree {
    /// Children must point forward, so traversal always terminates.
    pub fn validate(&self) -> Result<()> {
        let n = self.value.len();
        if n == 0 {
            return Err(invalid("tree has no nodes"));
        }
        let lengths = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!(
                "tree node arrays differ in length: {lengths:?} vs {n} values"
            )));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                if right >= 0 {
                    return Err(invalid(format!("node {node} has only a right child")));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!("node {node} has child {child} out of range")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= CHANNEL_COUNT as i64 {
                return Err(invalid(format!("node {node} splits on feature {feature}")));
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &Row) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            node = if row[self.feature[node] as usize] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
        Ok(rows.iter().map(|row| self.predict_row(row)).collect())
    }
}

// ---------------------------------------------------------------------------
// Random forest
// ---------------------------------------------------------------------------

/// Majority vote over trees; ties go to the smallest label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if let Err(FaultError::InvalidModel(msg)) = tree.validate() {
                return Err(invalid(format!("tree {i}: {msg}")));
            }
        }
        Ok(())
    }

    fn vote(&self, row: &Row) -> f64 {
        let mut tally: Vec<(f64, usize)> = Vec::new();
        for tree in &self.trees {
            let label = tree.predict_row(row);
            match tally.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((label, 1)),
            }
        }
        tally
            .into_iter()
            .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then(lb.total_cmp(la)))
            .map(|(label, _)| label)
            .unwrap_or(f64::NAN)
    }
}

impl Classifier for RandomForest {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
        Ok(rows.iter().map(|row| self.vote(row)).collect())
    }
}

// ---------------------------------------------------------------------------
// Linear one-vs-rest
// ---------------------------------------------------------------------------

/// `score_k = coef[k] · row + intercept[k]`; the highest score wins.
///
/// With two classes a single coefficient row is accepted: a positive score
/// picks `classes[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<f64>,
    pub coef: Vec<[f64; CHANNEL_COUNT]>,
    pub intercept: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(invalid("linear model has no classes"));
        }
        if self.coef.len() != self.intercept.len() {
            return Err(invalid(format!(
                "{} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }
        if !(self.coef.len() == self.classes.len() || self.is_binary()) {
            return Err(invalid(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        Ok(())
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn score(&self, k: usize, row: &Row) -> f64 {
        self.coef[k]
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept[k]
    }

    fn predict_row(&self, row: &Row) -> f64 {
        if self.is_binary() {
            return if self.score(0, row) > 0.0 {
                self.classes[1]
            } else {
                self.classes[0]
            };
        }
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for k in 0..self.classes.len() {
            let s = self.score(k, row);
            if s > best_score {
                best = k;
                best_score = s;
            }
        }
        self.classes[best]
    }
}

impl Classifier for LinearModel {
    fn predict(&self, rows: &[Row]) -> Result<Vec<f64>> {
        Ok(rows.iter().map(|row| self.predict_row(row)).collect())
    }
}

fn invalid(msg: impl Into<String>) -> FaultError {
    FaultError::InvalidModel(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vp1 <= 100 → 0, else 100.
    fn stump() -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![100.0, -2.0, -2.0],
            value: vec![0.0, 0.0, 100.0],
        }
    }

    #[test]
    fn tree_routes_on_threshold() {
        let tree = stump();
        tree.validate().unwrap();
        let preds = tree
            .predict(&[[99.0, 0.0, 0.0], [100.0, 0.0, 0.0], [101.0, 0.0, 0.0]])
            .unwrap();
        assert_eq!(preds, vec![0.0, 0.0, 100.0]);
    }

    #[test]
    fn tree_with_backward_child_is_rejected() {
        let mut tree = stump();
        tree.children_right[0] = 0;
        assert!(matches!(tree.validate(), Err(FaultError::InvalidModel(_))));
    }

    #[test]
    fn tree_with_bad_feature_is_rejected() {
        let mut tree = stump();
        tree.feature[0] = 3;
        assert!(matches!(tree.validate(), Err(FaultError::InvalidModel(_))));
    }

    #[test]
    fn forest_majority_and_tie_break() {
        let mut high = stump();
        high.value = vec![0.0, 1.0, 111.0];
        let forest = RandomForest {
            trees: vec![stump(), stump(), high.clone()],
        };
        forest.validate().unwrap();
        assert_eq!(forest.predict(&[[150.0, 0.0, 0.0]]).unwrap(), vec![100.0]);

        let tied = RandomForest {
            trees: vec![stump(), high],
        };
        assert_eq!(tied.predict(&[[150.0, 0.0, 0.0]]).unwrap(), vec![100.0]);
        assert_eq!(tied.predict(&[[50.0, 0.0, 0.0]]).unwrap(), vec![0.0]);
    }

    #[test]
    fn linear_picks_highest_score() {
        let model = LinearModel {
            classes: vec![0.0, 10.0, 11.0],
            coef: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            intercept: vec![0.5, 0.0, 0.0],
        };
        model.validate().unwrap();
        let preds = model
            .predict(&[[0.0, 0.0, 0.0], [2.0, 1.0, 0.0], [1.0, 3.0, 0.0]])
            .unwrap();
        assert_eq!(preds, vec![0.0, 10.0, 11.0]);
    }

    #[test]
    fn linear_binary_uses_sign() {
        let model = LinearModel {
            classes: vec![0.0, 1.0],
            coef: vec![[1.0, 0.0, 0.0]],
            intercept: vec![-100.0],
        };
        model.validate().unwrap();
        assert_eq!(
            model.predict(&[[99.0, 0.0, 0.0], [101.0, 0.0, 0.0]]).unwrap(),
            vec![0.0, 1.0]
        );
    }

    #[test]
    fn load_model_reads_tagged_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = ModelArtifact::DecisionTree(stump());
        std::fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.predict(&[[120.0, 0.0, 0.0]]).unwrap(), vec![100.0]);
    }

    #[test]
    fn load_model_rejects_unknown_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{ "kind": "svm" }"#).unwrap();

        assert!(matches!(load_model(&path), Err(FaultError::Json(_))));
    }
}
