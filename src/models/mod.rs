/// Модель и всё, что вокруг неё

pub mod evaluation;
pub mod predictor;
pub mod regressor;

pub use predictor::CostPredictor;
pub use regressor::{LinearRegressor, ModelArtifact, Regressor, TreeEnsemble, TreeNode};
