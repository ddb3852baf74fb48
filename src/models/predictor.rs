//! Адаптер предсказания: вектор признаков -> стоимость в валюте отображения

use crate::currency::{format_millions, CurrencyTable};
use crate::error::Result;
use crate::models::evaluation::local_mae;
use crate::models::regressor::Regressor;
use crate::preprocessing::{FeatureEngineer, TransformSpec};
use crate::types::{FeatureVector, HistoricalRecord, PredictionResult};

pub struct CostPredictor<'a> {
    model: &'a dyn Regressor,
    engineer: &'a FeatureEngineer<'a>,
    transforms: &'a TransformSpec,
    historical: &'a [HistoricalRecord],
    currencies: &'a CurrencyTable,
}

impl<'a> CostPredictor<'a> {
    pub fn new(
        model: &'a dyn Regressor,
        engineer: &'a FeatureEngineer<'a>,
        transforms: &'a TransformSpec,
        historical: &'a [HistoricalRecord],
        currencies: &'a CurrencyTable,
    ) -> Self {
        Self {
            model,
            engineer,
            transforms,
            historical,
            currencies,
        }
    }

    /// `length` - запрошенная длина трассы (км) до преобразований,
    /// по ней выбираются сопоставимые проекты для оценки ошибки.
    pub fn predict(&self, vector: &FeatureVector, length: f64, currency: &str) -> Result<PredictionResult> {
        // Неизвестная валюта отклоняется до вызова модели
        self.currencies.rate(currency)?;

        let row = self.engineer.encode(vector)?;
        let output = self.model.predict_row(row.view())?;

        // Обратное преобразование целевой переменной: млн USD
        let usd_millions = self.transforms.inverse_target(output)?;
        let point_estimate = self.currencies.convert(usd_millions, currency)?;

        let band = local_mae(self.historical, length);
        let (error_estimate, comparable_projects) = match band {
            Some((mae, n)) => (Some(self.currencies.convert(mae, currency)?), n),
            None => (None, 0),
        };

        tracing::info!(
            "Predicted {:.2} M USD (model output {:.4}, {} model, {} comparable projects)",
            usd_millions,
            output,
            self.model.family(),
            comparable_projects
        );

        let currency = currency.to_uppercase();
        Ok(PredictionResult {
            point_estimate,
            transformed_model_output: output,
            error_estimate,
            comparable_projects,
            display_value: format_millions(point_estimate, &currency),
            currency,
        })
    }
}
