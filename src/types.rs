/// Типы данных для конвейера предсказания стоимости

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const LENGTH: &str = "length";
pub const TUNNEL: &str = "tunnel";
pub const AT_GRADE: &str = "at_grade";
pub const ELEVATED: &str = "elevated";
pub const DURATION: &str = "duration";
pub const STATIONS: &str = "stations";

/// Сырые значения формы: непрерывные поля и категориальные описания проекта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub length: f64, // км
    #[serde(default)]
    pub tunnel: f64,
    #[serde(default)]
    pub at_grade: f64,
    #[serde(default)]
    pub elevated: f64,
    pub duration: f64, // годы
    pub stations: f64,
    /// region, sub_region, soil_type, train_type, ... -> выбранная метка
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl ProjectInput {
    pub fn continuous(&self) -> [(&'static str, f64); 6] {
        [
            (LENGTH, self.length),
            (TUNNEL, self.tunnel),
            (AT_GRADE, self.at_grade),
            (ELEVATED, self.elevated),
            (DURATION, self.duration),
            (STATIONS, self.stations),
        ]
    }

    pub fn continuous_value(&self, name: &str) -> Option<f64> {
        self.continuous()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        self.categories.get(name).map(String::as_str)
    }

    /// Сумма подземного, наземного и эстакадного участков
    pub fn sub_length_total(&self) -> f64 {
        self.tunnel + self.at_grade + self.elevated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(value) => Some(*value),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            FeatureValue::Numeric(_) => None,
            FeatureValue::Categorical(label) => Some(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub value: FeatureValue,
}

/// Упорядоченный вектор признаков в порядке колонок обучающей выборки
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub columns: Vec<FeatureColumn>,
}

impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.value)
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_numeric)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Исторический проект: фактическая и предсказанная стоимость (млн USD 2021)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub length: f64,
    #[serde(default)]
    pub tunnel: f64,
    #[serde(alias = "cost_real_2021")]
    pub actual_cost: f64,
    #[serde(alias = "prediction_label")]
    pub predicted_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub input: ProjectInput,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub point_estimate: f64,
    pub transformed_model_output: f64,
    /// MAE по сопоставимым историческим проектам, в валюте отображения
    pub error_estimate: Option<f64>,
    pub comparable_projects: usize,
    pub currency: String,
    pub display_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualPoint {
    pub length: f64,
    pub tunnel: f64,
    pub actual: f64,
    pub predicted: f64,
    pub residual: f64,
    pub standardized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: String,
    pub count: usize,
    pub mean_residual: f64,
    pub mae: f64,
    pub mean_standardized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsOutput {
    pub overall: SegmentSummary,
    pub by_length: Vec<SegmentSummary>,
    pub by_tunnel: Vec<SegmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
