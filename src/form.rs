//! Форма калькулятора: диапазоны ползунков, варианты выбора и проверка ввода

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CostError, Result};
use crate::preprocessing::schema::{ColumnKind, FeatureSchema};
use crate::types::{ProjectInput, AT_GRADE, DURATION, ELEVATED, LENGTH, STATIONS, TUNNEL};

const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
}

/// Верхние границы ползунков участков при текущем выборе
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderLimits {
    pub length: f64,
    pub tunnel_max: f64,
    pub at_grade_max: f64,
    pub elevated_max: f64,
    pub remaining: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub ranges: BTreeMap<String, SliderRange>,
    /// Категориальное поле -> допустимые метки
    pub options: BTreeMap<String, Vec<String>>,
    /// Регион -> варианты подрегиона
    pub sub_regions: BTreeMap<String, Vec<String>>,
}

fn default_ranges() -> BTreeMap<String, SliderRange> {
    [
        (LENGTH, SliderRange::new(1.0, 25.0)),
        (TUNNEL, SliderRange::new(0.0, 25.0)),
        (AT_GRADE, SliderRange::new(0.0, 25.0)),
        (ELEVATED, SliderRange::new(0.0, 25.0)),
        (DURATION, SliderRange::new(0.0, 25.0)),
        (STATIONS, SliderRange::new(0.0, 25.0)),
    ]
    .into_iter()
    .map(|(name, range)| (name.to_string(), range))
    .collect()
}

fn default_sub_regions() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        (
            "Asia",
            &[
                "Eastern Asia",
                "Central Asia",
                "Southern Asia",
                "Western Asia",
                "South-eastern Asia",
            ],
        ),
        (
            "Europe",
            &[
                "Southern Europe",
                "Western Europe",
                "Eastern Europe",
                "Northern Europe",
            ],
        ),
        (
            "Americas",
            &["Northern America", "Latin America and the Caribbean"],
        ),
        ("Africa", &["Northern Africa"]),
        ("Central America", &["Latin America and the Caribbean"]),
    ];

    table
        .iter()
        .map(|(region, subs)| {
            (
                region.to_string(),
                subs.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

impl FormSchema {
    /// Варианты выбора берутся из категориальных колонок схемы модели
    pub fn from_feature_schema(schema: &FeatureSchema) -> Self {
        let options = schema
            .model_columns()
            .filter_map(|c| match &c.kind {
                ColumnKind::Categorical { categories } => Some((c.name.clone(), categories.clone())),
                _ => None,
            })
            .collect();

        Self {
            ranges: default_ranges(),
            options,
            sub_regions: default_sub_regions(),
        }
    }

    pub fn range(&self, field: &str) -> Option<SliderRange> {
        self.ranges.get(field).copied()
    }

    pub fn sub_region_choices(&self, region: &str) -> Option<&[String]> {
        self.sub_regions.get(region).map(Vec::as_slice)
    }

    /// Сколько длины ещё можно распределить между участками
    pub fn remaining_length(&self, input: &ProjectInput) -> f64 {
        (input.length - input.sub_length_total()).max(0.0)
    }

    /// Ползунки участков сужаются по мере выбора: тоннель до всей длины,
    /// наземный участок до остатка после тоннеля, эстакада до остатка после обоих.
    pub fn slider_limits(&self, input: &ProjectInput) -> Result<SliderLimits> {
        let length = self.floor_length(input.length)?;
        let cap = |field: &str, value: f64| match self.range(field) {
            Some(range) => value.clamp(range.min, range.max),
            None => value.max(0.0),
        };

        let tunnel_max = cap(TUNNEL, length);
        let at_grade_max = cap(AT_GRADE, length - input.tunnel);
        let elevated_max = cap(ELEVATED, length - input.tunnel - input.at_grade);

        Ok(SliderLimits {
            length,
            tunnel_max,
            at_grade_max,
            elevated_max,
            remaining: self.remaining_length(&ProjectInput { length, ..input.clone() }),
        })
    }

    /// Отрицательная длина -> RangeError, длина из [0, минимум) поднимается до минимума
    fn floor_length(&self, length: f64) -> Result<f64> {
        if !length.is_finite() {
            return Err(CostError::Range("length must be a finite number".into()));
        }
        if length < 0.0 {
            return Err(CostError::Range(format!("length = {length} must not be negative")));
        }
        match self.range(LENGTH) {
            Some(range) if length < range.min => {
                tracing::warn!("Length {} below minimum, clamped to {}", length, range.min);
                Ok(range.min)
            }
            _ => Ok(length),
        }
    }

    /// Проверка формы. Длина ниже минимума поднимается до минимума,
    /// отрицательная длина и остальные нарушения -> RangeError.
    pub fn validate(&self, input: &ProjectInput) -> Result<ProjectInput> {
        let mut input = input.clone();
        input.length = self.floor_length(input.length)?;

        for (field, value) in input.continuous() {
            if !value.is_finite() {
                return Err(CostError::Range(format!("{field} must be a finite number")));
            }
            if let Some(range) = self.range(field) {
                if !range.contains(value) {
                    return Err(CostError::Range(format!(
                        "{field} = {value} outside [{}, {}]",
                        range.min, range.max
                    )));
                }
            }
        }

        let total = input.sub_length_total();
        if total > input.length + SUM_TOLERANCE {
            return Err(CostError::Range(format!(
                "tunnel + at_grade + elevated = {total} exceeds length {}",
                input.length
            )));
        }

        for (field, label) in &input.categories {
            if let Some(options) = self.options.get(field) {
                if !options.iter().any(|o| o == label) {
                    return Err(CostError::Range(format!("'{label}' is not an option for {field}")));
                }
            }
        }

        if let (Some(region), Some(sub_region)) = (input.category("region"), input.category("sub_region")) {
            if let Some(choices) = self.sub_region_choices(region) {
                if !choices.iter().any(|c| c == sub_region) {
                    return Err(CostError::Range(format!(
                        "sub_region '{sub_region}' is not in region '{region}'"
                    )));
                }
            }
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::schema::ColumnSpec;

    fn form() -> FormSchema {
        let schema = FeatureSchema {
            target: None,
            columns: vec![
                ColumnSpec { name: "length".into(), kind: ColumnKind::Continuous },
                ColumnSpec {
                    name: "region".into(),
                    kind: ColumnKind::Categorical {
                        categories: vec!["Asia".into(), "Europe".into()],
                    },
                },
                ColumnSpec {
                    name: "sub_region".into(),
                    kind: ColumnKind::Categorical {
                        categories: vec!["Eastern Asia".into(), "Western Europe".into()],
                    },
                },
            ],
        };
        FormSchema::from_feature_schema(&schema)
    }

    fn input(length: f64, tunnel: f64, at_grade: f64, elevated: f64) -> ProjectInput {
        ProjectInput {
            length,
            tunnel,
            at_grade,
            elevated,
            duration: 5.0,
            stations: 8.0,
            categories: BTreeMap::from([
                ("region".to_string(), "Asia".to_string()),
                ("sub_region".to_string(), "Eastern Asia".to_string()),
            ]),
        }
    }

    #[test]
    fn options_come_from_categorical_columns() {
        let form = form();
        assert_eq!(form.options.len(), 2);
        assert_eq!(form.options["region"], vec!["Asia", "Europe"]);
        assert_eq!(form.range("length"), Some(SliderRange::new(1.0, 25.0)));
    }

    #[test]
    fn zero_length_is_clamped_to_floor() {
        let validated = form().validate(&input(0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(validated.length, 1.0);
    }

    #[test]
    fn negative_length_is_rejected() {
        let form = form();
        assert!(matches!(form.validate(&input(-1.0, 0.0, 0.0, 0.0)), Err(CostError::Range(_))));
        assert!(matches!(form.validate(&input(-50.0, 0.0, 0.0, 0.0)), Err(CostError::Range(_))));

        let barely_started = form.validate(&input(0.4, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(barely_started.length, 1.0);
    }

    #[test]
    fn slider_limits_follow_previous_sections() {
        let form = form();

        let limits = form.slider_limits(&input(12.0, 5.0, 4.0, 0.0)).unwrap();
        assert_eq!(limits.tunnel_max, 12.0);
        assert_eq!(limits.at_grade_max, 7.0);
        assert_eq!(limits.elevated_max, 3.0);
        assert_eq!(limits.remaining, 3.0);

        let underground = form.slider_limits(&input(10.0, 10.0, 0.0, 0.0)).unwrap();
        assert_eq!(underground.at_grade_max, 0.0);
        assert_eq!(underground.elevated_max, 0.0);

        let clamped = form.slider_limits(&input(0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(clamped.length, 1.0);
        assert_eq!(clamped.tunnel_max, 1.0);

        assert!(matches!(form.slider_limits(&input(-3.0, 0.0, 0.0, 0.0)), Err(CostError::Range(_))));
    }

    #[test]
    fn fully_underground_leaves_nothing_for_other_sections() {
        let form = form();
        let fully_underground = input(10.0, 10.0, 0.0, 0.0);

        let validated = form.validate(&fully_underground).unwrap();
        assert_eq!(validated.at_grade, 0.0);
        assert_eq!(validated.elevated, 0.0);
        assert_eq!(form.remaining_length(&validated), 0.0);

        assert!(matches!(
            form.validate(&input(10.0, 10.0, 1.0, 0.0)),
            Err(CostError::Range(_))
        ));
    }

    #[test]
    fn remaining_length_shrinks_as_sections_are_chosen() {
        let form = form();
        assert_eq!(form.remaining_length(&input(12.0, 0.0, 0.0, 0.0)), 12.0);
        assert_eq!(form.remaining_length(&input(12.0, 5.0, 0.0, 0.0)), 7.0);
        assert_eq!(form.remaining_length(&input(12.0, 5.0, 4.0, 0.0)), 3.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let form = form();
        assert!(matches!(form.validate(&input(30.0, 0.0, 0.0, 0.0)), Err(CostError::Range(_))));
        assert!(matches!(form.validate(&input(10.0, -1.0, 0.0, 0.0)), Err(CostError::Range(_))));

        let mut too_many_stations = input(10.0, 0.0, 0.0, 0.0);
        too_many_stations.stations = 40.0;
        assert!(matches!(form.validate(&too_many_stations), Err(CostError::Range(_))));

        let mut nan = input(10.0, 0.0, 0.0, 0.0);
        nan.duration = f64::NAN;
        assert!(matches!(form.validate(&nan), Err(CostError::Range(_))));
    }

    #[test]
    fn labels_must_be_known_options() {
        let mut unknown = input(10.0, 0.0, 0.0, 0.0);
        unknown.categories.insert("region".into(), "Oceania".into());
        assert!(matches!(form().validate(&unknown), Err(CostError::Range(_))));
    }

    #[test]
    fn sub_region_must_belong_to_region() {
        let mut mismatch = input(10.0, 0.0, 0.0, 0.0);
        mismatch.categories.insert("sub_region".into(), "Western Europe".into());
        assert!(matches!(form().validate(&mismatch), Err(CostError::Range(_))));
    }
}
