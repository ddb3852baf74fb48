//! Ошибки конвейера предсказания

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostError {
    /// Box-Cox требует строго положительного аргумента
    #[error("transform error: {0}")]
    Transform(String),

    /// В собранном векторе признаков не хватает колонки или категория неизвестна
    #[error("schema error: {0}")]
    Schema(String),

    /// Значение формы вне допустимого диапазона
    #[error("range error: {0}")]
    Range(String),

    #[error("artifact error: {0}")]
    Artifact(String),
}

impl CostError {
    /// Короткое имя вида ошибки для ответа API
    pub fn kind(&self) -> &'static str {
        match self {
            CostError::Transform(_) => "transform_error",
            CostError::Schema(_) => "schema_error",
            CostError::Range(_) => "range_error",
            CostError::Artifact(_) => "artifact_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CostError>;
