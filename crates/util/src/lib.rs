pub mod config;

use std::env;

pub use config::{
    AppConfig, ConfigError, Environment, Invocation, ReportConfig, ReportConfigBuilder,
    ReportTarget, SampleConfig,
};

pub const DEFAULT_PRODUCTS_FILE: &str = "products.csv";
pub const DEFAULT_ORDERS_FILE: &str = "order_products.csv";
pub const DEFAULT_REPORT_TO: &str = "report.csv";
pub const DEFAULT_SAMPLES: usize = 100;

/// Report destination value that selects standard output.
pub const STDOUT_SENTINEL: &str = "-";

pub const PRODUCTS_FILE_ENV: &str = "DEPT_REPORT_PRODUCTS_FILE";
pub const ORDERS_FILE_ENV: &str = "DEPT_REPORT_ORDERS_FILE";
pub const REPORT_TO_ENV: &str = "DEPT_REPORT_REPORT_TO";
pub const METRICS_FILE_ENV: &str = "DEPT_REPORT_METRICS_FILE";

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe in production builds
/// where dotenv files are not deployed. Variables already set in the process
/// environment take precedence over the file.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the value of `var`, treating unset and empty values alike.
pub fn env_value(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::LazyLock<std::sync::Mutex<()>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(()));
