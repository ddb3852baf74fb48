/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod schema;

pub use feature_engineering::FeatureEngineer;
pub use normalization::{boxcox, inv_boxcox, TransformSpec};
pub use schema::{ColumnKind, ColumnSpec, FeatureSchema, Gate, InteractionTable, InteractionTerm};
