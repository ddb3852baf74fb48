//! Обученная модель как непрозрачная возможность `predict(row) -> number`

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{CostError, Result};

/// Любая регрессионная модель с предсказанием по одной строке
pub trait Regressor: Send + Sync {
    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64>;

    /// Ожидаемая ширина строки, если модель её знает
    fn n_features(&self) -> Option<usize>;

    fn family(&self) -> &'static str;
}

/// Линейная модель: intercept + w·x
pub struct LinearRegressor {
    weights: Array1<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights: Array1::from(weights),
            intercept,
        }
    }
}

impl Regressor for LinearRegressor {
    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if row.len() != self.weights.len() {
            return Err(CostError::Schema(format!(
                "linear model expects {} features, got {}",
                self.weights.len(),
                row.len()
            )));
        }
        Ok(self.intercept + row.dot(&self.weights))
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn family(&self) -> &'static str {
        "linear"
    }
}

/// Узел дерева регрессии. Сериализуется как `{"value": ..}` или
/// `{"feature": .., "threshold": .., "left": .., "right": ..}`.
/// Split идёт первым: у внутренних узлов бывает поле `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn predict(&self, row: &ArrayView1<f64>) -> Result<f64> {
        match self {
            TreeNode::Leaf { value } => Ok(*value),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature).ok_or_else(|| {
                    CostError::Schema(format!(
                        "tree splits on feature {feature}, row has {}",
                        row.len()
                    ))
                })?;
                if *x < *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split {
                feature, left, right, ..
            } => [Some(*feature), left.max_feature(), right.max_feature()]
                .into_iter()
                .flatten()
                .max(),
        }
    }
}

/// Градиентный бустинг деревьев: base_score + learning_rate * Σ tree(x)
pub struct TreeEnsemble {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<TreeNode>,
    n_features: Option<usize>,
}

impl TreeEnsemble {
    pub fn new(
        base_score: f64,
        learning_rate: f64,
        trees: Vec<TreeNode>,
        n_features: Option<usize>,
    ) -> Self {
        Self {
            base_score,
            learning_rate,
            trees,
            n_features,
        }
    }
}

impl Regressor for TreeEnsemble {
    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if let Some(expected) = self.n_features {
            if row.len() != expected {
                return Err(CostError::Schema(format!(
                    "tree ensemble expects {expected} features, got {}",
                    row.len()
                )));
            }
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(&row)?;
        }
        Ok(self.base_score + self.learning_rate * sum)
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn family(&self) -> &'static str {
        "tree_ensemble"
    }
}

/// Сериализованный артефакт модели (`model.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear {
        weights: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        trees: Vec<TreeNode>,
        #[serde(default)]
        n_features: Option<usize>,
    },
}

fn default_learning_rate() -> f64 {
    1.0
}

impl ModelArtifact {
    pub fn into_regressor(self) -> Result<Box<dyn Regressor>> {
        match self {
            ModelArtifact::Linear { weights, intercept } => {
                if weights.is_empty() {
                    return Err(CostError::Artifact("linear model has no weights".to_string()));
                }
                Ok(Box::new(LinearRegressor::new(weights, intercept)))
            }
            ModelArtifact::TreeEnsemble {
                base_score,
                learning_rate,
                trees,
                n_features,
            } => {
                if let (Some(width), Some(max)) =
                    (n_features, trees.iter().filter_map(TreeNode::max_feature).max())
                {
                    if max >= width {
                        return Err(CostError::Artifact(format!(
                            "tree splits on feature {max}, but model has {width} features"
                        )));
                    }
                }
                Ok(Box::new(TreeEnsemble::new(
                    base_score,
                    learning_rate,
                    trees,
                    n_features,
                )))
            }
        }
    }
}
