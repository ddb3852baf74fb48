//! Feature engineering: сырые значения формы -> вектор признаков модели

use std::collections::BTreeMap;

use ndarray::Array1;

use super::normalization::TransformSpec;
use super::schema::{ColumnKind, FeatureSchema, InteractionTable};
use crate::error::{CostError, Result};
use crate::types::{FeatureColumn, FeatureValue, FeatureVector, ProjectInput};

/// Собирает вектор признаков. Состояния нет: результат зависит только от входа
/// и загруженных параметров.
pub struct FeatureEngineer<'a> {
    schema: &'a FeatureSchema,
    transforms: &'a TransformSpec,
    interactions: &'a InteractionTable,
}

impl<'a> FeatureEngineer<'a> {
    pub fn new(
        schema: &'a FeatureSchema,
        transforms: &'a TransformSpec,
        interactions: &'a InteractionTable,
    ) -> Self {
        Self {
            schema,
            transforms,
            interactions,
        }
    }

    pub fn featurize(&self, input: &ProjectInput) -> Result<FeatureVector> {
        let mut assembled: BTreeMap<String, FeatureValue> = BTreeMap::new();

        // Непрерывные признаки (Box-Cox там, где есть lambda)
        for (name, raw) in input.continuous() {
            let value = self.transforms.forward(name, raw)?;
            assembled.insert(name.to_string(), FeatureValue::Numeric(value));
        }

        // Категориальные признаки храним меткой, кодируем только на входе модели
        for (name, label) in &input.categories {
            assembled.insert(name.clone(), FeatureValue::Categorical(label.clone()));
        }

        // Члены взаимодействия присутствуют всегда, неактивные равны 0
        for term in self.interactions.iter() {
            let value = term.evaluate(input)?;
            assembled.insert(term.name.clone(), FeatureValue::Numeric(value));
        }

        // Порядок колонок обучающей выборки
        let mut columns = Vec::with_capacity(assembled.len());
        for spec in self.schema.model_columns() {
            let value = assembled.remove(&spec.name).ok_or_else(|| {
                CostError::Schema(format!("missing required column '{}'", spec.name))
            })?;

            let kind_matches = match (&spec.kind, &value) {
                (ColumnKind::Categorical { .. }, FeatureValue::Categorical(_)) => true,
                (ColumnKind::Continuous | ColumnKind::Interaction, FeatureValue::Numeric(_)) => true,
                _ => false,
            };
            if !kind_matches {
                return Err(CostError::Schema(format!(
                    "column '{}' has the wrong value kind",
                    spec.name
                )));
            }

            columns.push(FeatureColumn {
                name: spec.name.clone(),
                value,
            });
        }

        tracing::debug!(
            "Featurized input into {} columns ({} unused fields)",
            columns.len(),
            assembled.len()
        );

        Ok(FeatureVector { columns })
    }

    /// One-hot кодирование на границе модели
    pub fn encode(&self, vector: &FeatureVector) -> Result<Array1<f64>> {
        let n_columns = self.schema.model_columns().count();
        if vector.len() != n_columns {
            return Err(CostError::Schema(format!(
                "feature vector has {} columns, model expects {}",
                vector.len(),
                n_columns
            )));
        }

        let mut row = Array1::zeros(self.schema.encoded_width());
        let mut idx = 0;

        for (spec, column) in self.schema.model_columns().zip(&vector.columns) {
            if spec.name != column.name {
                return Err(CostError::Schema(format!(
                    "column order mismatch: expected '{}', got '{}'",
                    spec.name, column.name
                )));
            }

            match (&spec.kind, &column.value) {
                (ColumnKind::Categorical { categories }, FeatureValue::Categorical(label)) => {
                    let position = categories.iter().position(|c| c == label).ok_or_else(|| {
                        CostError::Schema(format!(
                            "unknown category '{label}' for column '{}'",
                            spec.name
                        ))
                    })?;
                    row[idx + position] = 1.0;
                    idx += categories.len();
                }
                (ColumnKind::Continuous | ColumnKind::Interaction, FeatureValue::Numeric(value)) => {
                    row[idx] = *value;
                    idx += 1;
                }
                _ => {
                    return Err(CostError::Schema(format!(
                        "column '{}' has the wrong value kind",
                        spec.name
                    )));
                }
            }
        }

        Ok(row)
    }
}
