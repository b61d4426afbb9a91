//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::money::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// The platform settlement currency.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Payment gateway configuration.
    pub gateway: GatewayConfig,
    /// Platform fee configuration.
    pub fees: FeeConfig,
    /// Withdrawal workflow configuration.
    pub withdrawal: WithdrawalConfig,
    /// Maturity sweep configuration.
    pub sweep: SweepConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_currency() -> Currency {
    Currency::Ngn
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Shared secret used to verify webhook signatures.
    pub webhook_secret: String,
}

/// Platform fee configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Platform fee as a percentage of the ticket price.
    #[serde(default = "default_platform_fee_percent")]
    pub platform_fee_percent: Decimal,
}

fn default_platform_fee_percent() -> Decimal {
    Decimal::new(5, 0)
}

/// Withdrawal workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalConfig {
    /// Minimum withdrawable amount in major units.
    #[serde(default = "default_minimum_amount")]
    pub minimum_amount: Decimal,
    /// OTP time-to-live in seconds.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: u64,
    /// Maximum OTP verification attempts before the request is cancelled.
    #[serde(default = "default_max_otp_attempts")]
    pub max_otp_attempts: i32,
}

fn default_minimum_amount() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_otp_ttl_secs() -> u64 {
    600 // 10 minutes
}

fn default_max_otp_attempts() -> i32 {
    5
}

/// Maturity sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Interval between sweep runs in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TIXERA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
