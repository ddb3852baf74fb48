//! Transit Cost Estimator - оценка стоимости строительства городского рельсового транспорта

pub mod api;
pub mod config;
pub mod context;
pub mod currency;
pub mod error;
pub mod form;
pub mod models;
pub mod preprocessing;
pub mod types;

pub use config::Config;
pub use context::ModelContext;
pub use error::{CostError, Result};
pub use models::*;
pub use preprocessing::*;
pub use types::*;
