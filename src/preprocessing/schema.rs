//! Схема признаков обучающей выборки и таблица взаимодействий

use serde::{Deserialize, Serialize};

use crate::error::{CostError, Result};
use crate::types::ProjectInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Continuous,
    /// Метки в порядке one-hot кодирования
    Categorical { categories: Vec<String> },
    Interaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

/// Колонки в том порядке, в котором модель их видела при обучении
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    #[serde(default)]
    pub target: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    /// Колонки модели (без целевой переменной)
    pub fn model_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(move |c| self.target.as_deref() != Some(c.name.as_str()))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.model_columns().find(|c| c.name == name)
    }

    /// Ширина строки после one-hot кодирования
    pub fn encoded_width(&self) -> usize {
        self.model_columns()
            .map(|c| match &c.kind {
                ColumnKind::Categorical { categories } => categories.len(),
                _ => 1,
            })
            .sum()
    }

    /// Имена колонок строки модели: `region_Asia`, `length`, ...
    pub fn encoded_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.encoded_width());
        for column in self.model_columns() {
            match &column.kind {
                ColumnKind::Categorical { categories } => {
                    names.extend(categories.iter().map(|c| format!("{}_{}", column.name, c)));
                }
                _ => names.push(column.name.clone()),
            }
        }
        names
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CostError::Schema(format!("duplicate column '{}'", column.name)));
            }
            if let ColumnKind::Categorical { categories } = &column.kind {
                if categories.is_empty() {
                    return Err(CostError::Schema(format!(
                        "categorical column '{}' has no categories",
                        column.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub field: String,
    pub equals: String,
}

/// Член взаимодействия: произведение числовых факторов, если все условия выполнены, иначе 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionTerm {
    pub name: String,
    pub factors: Vec<String>,
    #[serde(default)]
    pub gates: Vec<Gate>,
}

impl InteractionTerm {
    pub fn is_active(&self, input: &ProjectInput) -> Result<bool> {
        for gate in &self.gates {
            let label = input.category(&gate.field).ok_or_else(|| {
                CostError::Schema(format!(
                    "interaction '{}' is gated on missing field '{}'",
                    self.name, gate.field
                ))
            })?;
            if label != gate.equals {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn evaluate(&self, input: &ProjectInput) -> Result<f64> {
        if !self.is_active(input)? {
            return Ok(0.0);
        }

        let mut value = 1.0;
        for factor in &self.factors {
            value *= input.continuous_value(factor).ok_or_else(|| {
                CostError::Schema(format!(
                    "interaction '{}' uses unknown factor '{factor}'",
                    self.name
                ))
            })?;
        }
        Ok(value)
    }
}

/// Таблица взаимодействий из процесса обучения
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionTable {
    pub terms: Vec<InteractionTerm>,
}

impl InteractionTable {
    pub fn new(terms: Vec<InteractionTerm>) -> Self {
        Self { terms }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionTerm> {
        self.terms.iter()
    }
}
