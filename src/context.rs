//! Неизменяемый контекст модели: все артефакты, загруженные при старте

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::currency::{CurrencyTable, BASE_CURRENCY};
use crate::error::{CostError, Result};
use crate::form::FormSchema;
use crate::models::evaluation;
use crate::models::predictor::CostPredictor;
use crate::models::regressor::{ModelArtifact, Regressor};
use crate::preprocessing::{FeatureEngineer, FeatureSchema, InteractionTable, TransformSpec};
use crate::types::{DiagnosticsOutput, FeatureVector, HistoricalRecord, PredictionResult, ProjectInput};

pub const MODEL_FILE: &str = "model.json";
pub const HISTORICAL_FILE: &str = "historical.json";
pub const TRANSFORMS_FILE: &str = "transforms.json";
pub const SCHEMA_FILE: &str = "schema.json";
pub const INTERACTIONS_FILE: &str = "interactions.json";
pub const CURRENCIES_FILE: &str = "currencies.json";

pub struct ModelContext {
    model: Box<dyn Regressor>,
    schema: FeatureSchema,
    transforms: TransformSpec,
    interactions: InteractionTable,
    historical: Vec<HistoricalRecord>,
    currencies: CurrencyTable,
    form: FormSchema,
    loaded_at: DateTime<Utc>,
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    let text = fs::read_to_string(&path)
        .map_err(|e| CostError::Artifact(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| CostError::Artifact(format!("{}: {e}", path.display())))
}

impl ModelContext {
    /// Проверяет согласованность артефактов и собирает контекст
    pub fn new(
        model: Box<dyn Regressor>,
        schema: FeatureSchema,
        transforms: TransformSpec,
        interactions: InteractionTable,
        historical: Vec<HistoricalRecord>,
        currencies: CurrencyTable,
    ) -> Result<Self> {
        schema.validate()?;

        if let Some(width) = model.n_features() {
            if width != schema.encoded_width() {
                return Err(CostError::Artifact(format!(
                    "{} model expects {width} features, schema encodes {}",
                    model.family(),
                    schema.encoded_width()
                )));
            }
        }

        for feature in transforms.features.keys() {
            if schema.column(feature).is_none() {
                tracing::warn!("Transform for '{}' has no column in the schema", feature);
            }
        }

        let form = FormSchema::from_feature_schema(&schema);

        Ok(Self {
            model,
            schema,
            transforms,
            interactions,
            historical,
            currencies,
            form,
            loaded_at: Utc::now(),
        })
    }

    /// Загрузка из каталога с JSON артефактами
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let model: ModelArtifact = read_json(dir, MODEL_FILE)?;
        let schema: FeatureSchema = read_json(dir, SCHEMA_FILE)?;
        let transforms: TransformSpec = read_json(dir, TRANSFORMS_FILE)?;
        let interactions: InteractionTable = read_json(dir, INTERACTIONS_FILE)?;
        let historical: Vec<HistoricalRecord> = read_json(dir, HISTORICAL_FILE)?;

        let currencies = if dir.join(CURRENCIES_FILE).exists() {
            let rates: BTreeMap<String, f64> = read_json(dir, CURRENCIES_FILE)?;
            CurrencyTable::new(rates)?
        } else {
            tracing::warn!("{} not found, only {} is available", CURRENCIES_FILE, BASE_CURRENCY);
            CurrencyTable::default()
        };

        let context = Self::new(
            model.into_regressor()?,
            schema,
            transforms,
            interactions,
            historical,
            currencies,
        )?;

        tracing::info!(
            "Loaded {} model: {} columns, {} interaction terms, {} historical projects",
            context.model.family(),
            context.schema.model_columns().count(),
            context.interactions.terms.len(),
            context.historical.len()
        );

        Ok(context)
    }

    fn engineer(&self) -> FeatureEngineer<'_> {
        FeatureEngineer::new(&self.schema, &self.transforms, &self.interactions)
    }

    pub fn featurize(&self, input: &ProjectInput) -> Result<FeatureVector> {
        let input = self.form.validate(input)?;
        self.engineer().featurize(&input)
    }

    /// Полный конвейер: проверка формы -> признаки -> модель -> валюта
    pub fn predict(&self, input: &ProjectInput, currency: &str) -> Result<PredictionResult> {
        let input = self.form.validate(input)?;
        let engineer = self.engineer();
        let vector = engineer.featurize(&input)?;

        let predictor = CostPredictor::new(
            self.model.as_ref(),
            &engineer,
            &self.transforms,
            &self.historical,
            &self.currencies,
        );
        predictor.predict(&vector, input.length, currency)
    }

    pub fn diagnostics(&self) -> DiagnosticsOutput {
        evaluation::diagnostics(&self.historical)
    }

    pub fn form(&self) -> &FormSchema {
        &self.form
    }

    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model_family(&self) -> &'static str {
        self.model.family()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::regressor::LinearRegressor;
    use crate::preprocessing::schema::{ColumnKind, ColumnSpec};

    fn schema() -> FeatureSchema {
        FeatureSchema {
            target: None,
            columns: vec![
                ColumnSpec { name: "length".into(), kind: ColumnKind::Continuous },
                ColumnSpec {
                    name: "region".into(),
                    kind: ColumnKind::Categorical { categories: vec!["Asia".into()] },
                },
            ],
        }
    }

    fn transforms() -> TransformSpec {
        TransformSpec {
            features: BTreeMap::new(),
            target_lambda: 0.0,
        }
    }

    #[test]
    fn model_width_must_match_schema() {
        let model = Box::new(LinearRegressor::new(vec![1.0, 1.0, 1.0], 0.0));
        let result = ModelContext::new(
            model,
            schema(),
            transforms(),
            InteractionTable::default(),
            Vec::new(),
            CurrencyTable::default(),
        );
        assert!(matches!(result, Err(CostError::Artifact(_))));
    }

    #[test]
    fn missing_directory_is_artifact_error() {
        let result = ModelContext::load("/nonexistent/transit-cost-artifacts");
        assert!(matches!(result, Err(CostError::Artifact(_))));
    }

    #[test]
    fn predict_without_history_has_no_error_band() {
        let model = Box::new(LinearRegressor::new(vec![0.0, 0.0], 2.0));
        let context = ModelContext::new(
            model,
            schema(),
            transforms(),
            InteractionTable::default(),
            Vec::new(),
            CurrencyTable::default(),
        )
        .unwrap();

        let input = ProjectInput {
            length: 5.0,
            tunnel: 0.0,
            at_grade: 5.0,
            elevated: 0.0,
            duration: 3.0,
            stations: 4.0,
            categories: BTreeMap::from([("region".to_string(), "Asia".to_string())]),
        };
        let result = context.predict(&input, "USD").unwrap();

        // exp(2) - 1
        assert!((result.point_estimate - (2.0_f64.exp() - 1.0)).abs() < 1e-9);
        assert_eq!(result.error_estimate, None);
        assert_eq!(result.comparable_projects, 0);
    }
}
