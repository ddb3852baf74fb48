/// Статическая таблица курсов и форматирование стоимости

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{CostError, Result};

pub const BASE_CURRENCY: &str = "USD";

/// Код валюты -> единиц за 1 USD
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CurrencyTable {
    rates: BTreeMap<String, f64>,
}

impl CurrencyTable {
    pub fn new(rates: BTreeMap<String, f64>) -> Result<Self> {
        let mut normalized = BTreeMap::new();
        for (code, rate) in rates {
            if !(rate > 0.0) || !rate.is_finite() {
                return Err(CostError::Artifact(format!("invalid rate {rate} for {code}")));
            }
            normalized.insert(code.to_uppercase(), rate);
        }
        normalized.entry(BASE_CURRENCY.to_string()).or_insert(1.0);
        Ok(Self { rates: normalized })
    }

    pub fn rate(&self, code: &str) -> Result<f64> {
        self.rates
            .get(&code.to_uppercase())
            .copied()
            .ok_or_else(|| CostError::Range(format!("unknown currency '{code}'")))
    }

    pub fn convert(&self, usd_millions: f64, code: &str) -> Result<f64> {
        Ok(usd_millions * self.rate(code)?)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self {
            rates: BTreeMap::from([(BASE_CURRENCY.to_string(), 1.0)]),
        }
    }
}

/// Значение в миллионах: от 1000 показываем миллиарды
pub fn format_millions(value: f64, code: &str) -> String {
    let code = code.to_uppercase();
    if value >= 1000.0 {
        format!("{:.2}B {code}", value / 1000.0)
    } else {
        format!("{value:.2} Million {code}")
    }
}
