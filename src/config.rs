/// Настройки сервиса из переменных окружения (и `.env`, если он есть)

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use crate::currency::BASE_CURRENCY;

pub const ADDR_VAR: &str = "TRANSIT_COST_ADDR";
pub const ARTIFACTS_VAR: &str = "TRANSIT_COST_ARTIFACTS";
pub const CURRENCY_VAR: &str = "TRANSIT_COST_CURRENCY";

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ARTIFACTS: &str = "artifacts";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub artifacts_dir: PathBuf,
    pub default_currency: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("{ADDR_VAR} is not a socket address: {addr}"))?;

        let artifacts_dir = lookup(ARTIFACTS_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS));

        let default_currency = lookup(CURRENCY_VAR)
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| BASE_CURRENCY.to_string());

        Ok(Self {
            addr,
            artifacts_dir,
            default_currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.default_currency, "USD");
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            (ADDR_VAR, "127.0.0.1:9100"),
            (ARTIFACTS_VAR, "/srv/models"),
            (CURRENCY_VAR, " eur "),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 9100);
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.default_currency, "EUR");
    }

    #[test]
    fn bad_address_is_reported() {
        let err = Config::from_lookup(lookup(&[(ADDR_VAR, "not-an-addr")])).unwrap_err();
        assert!(err.to_string().contains(ADDR_VAR));
    }
}
