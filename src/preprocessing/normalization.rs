//! Нормализация данных: преобразование Бокса-Кокса

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CostError, Result};

/// Сдвиг, применяемый перед преобразованием (x + 1), чтобы нули были допустимы
pub const SHIFT: f64 = 1.0;

const LAMBDA_EPS: f64 = 1e-19;

/// y = (x^λ - 1) / λ, при λ = 0 -> ln(x)
pub fn boxcox(x: f64, lambda: f64) -> Result<f64> {
    if !(x > 0.0) {
        return Err(CostError::Transform(format!(
            "box-cox requires a positive argument, got {x}"
        )));
    }

    if lambda.abs() < LAMBDA_EPS {
        Ok(x.ln())
    } else {
        Ok((x.powf(lambda) - 1.0) / lambda)
    }
}

/// Обратное преобразование: x = (λy + 1)^(1/λ), при λ = 0 -> exp(y)
pub fn inv_boxcox(y: f64, lambda: f64) -> Result<f64> {
    if lambda.abs() < LAMBDA_EPS {
        return Ok(y.exp());
    }

    let base = lambda * y + 1.0;
    if !(base > 0.0) {
        return Err(CostError::Transform(format!(
            "inverse box-cox undefined for y = {y}, lambda = {lambda}"
        )));
    }

    Ok(base.powf(1.0 / lambda))
}

/// Параметры преобразований, сохранённые вместе с моделью.
/// Загружаются один раз и больше не меняются.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    /// признак -> lambda
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
    /// lambda целевой переменной (стоимость)
    pub target_lambda: f64,
}

impl TransformSpec {
    pub fn lambda(&self, feature: &str) -> Option<f64> {
        self.features.get(feature).copied()
    }

    /// Прямое преобразование признака; признаки без lambda проходят как есть
    pub fn forward(&self, feature: &str, value: f64) -> Result<f64> {
        match self.lambda(feature) {
            Some(lambda) => boxcox(value + SHIFT, lambda).map_err(|e| match e {
                CostError::Transform(msg) => CostError::Transform(format!("{feature}: {msg}")),
                other => other,
            }),
            None => Ok(value),
        }
    }

    /// Выход модели -> стоимость в исходных единицах (млн USD)
    pub fn inverse_target(&self, output: f64) -> Result<f64> {
        Ok(inv_boxcox(output, self.target_lambda)? - SHIFT)
    }
}
