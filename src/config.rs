use crate::domain::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Price of one unit of collateral in debt units, served by the fixed feed.
    pub collateral_price: Decimal,
    pub params: LedgerParams,
}

/// Protocol constants and search tuning shared by the ledger engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerParams {
    /// Reserve component carried in every active position's debt.
    pub reserve_minimum: Decimal,
    /// Smallest debt, excluding the reserve, an active position may carry.
    pub min_net_debt: Decimal,
    /// Fee added to debt on every borrow, as a fraction of the borrowed amount.
    pub borrowing_fee_rate: Decimal,
    /// Collateral ratio (price-aware) below which weakening operations are refused.
    pub min_collateral_ratio: Decimal,
    pub hint_sample_attempts: usize,
    pub hint_seed: u64,
    /// Bound on the exact insert-position walk before a hint counts as stale.
    pub max_walk_steps: usize,
    /// Fresh approximate hints requested after a stale one.
    pub hint_retries: usize,
    /// 0 means unbounded.
    pub max_redemption_iterations: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            reserve_minimum: Decimal::from_int(200),
            min_net_debt: Decimal::from_int(1800),
            borrowing_fee_rate: Decimal::from_int(5) / Decimal::from_int(1000),
            min_collateral_ratio: Decimal::from_int(11) / Decimal::from_int(10),
            hint_sample_attempts: 50,
            hint_seed: 1_298_379,
            max_walk_steps: 1024,
            hint_retries: 3,
            max_redemption_iterations: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = LedgerParams::default();

        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;
        let collateral_price =
            parse_decimal_or(&env_map, "COLLATERAL_PRICE", Decimal::from_int(2000))?;

        let params = LedgerParams {
            reserve_minimum: parse_decimal_or(
                &env_map,
                "RESERVE_MINIMUM",
                defaults.reserve_minimum,
            )?,
            min_net_debt: parse_decimal_or(&env_map, "MIN_NET_DEBT", defaults.min_net_debt)?,
            borrowing_fee_rate: parse_decimal_or(
                &env_map,
                "BORROWING_FEE_RATE",
                defaults.borrowing_fee_rate,
            )?,
            min_collateral_ratio: parse_decimal_or(
                &env_map,
                "MIN_COLLATERAL_RATIO",
                defaults.min_collateral_ratio,
            )?,
            hint_sample_attempts: parse_or(
                &env_map,
                "HINT_SAMPLE_ATTEMPTS",
                defaults.hint_sample_attempts,
                "must be a valid usize",
            )?,
            hint_seed: parse_or(&env_map, "HINT_SEED", defaults.hint_seed, "must be a valid u64")?,
            max_walk_steps: parse_or(
                &env_map,
                "MAX_WALK_STEPS",
                defaults.max_walk_steps,
                "must be a valid usize",
            )?,
            hint_retries: parse_or(
                &env_map,
                "HINT_RETRIES",
                defaults.hint_retries,
                "must be a valid usize",
            )?,
            max_redemption_iterations: parse_or(
                &env_map,
                "MAX_REDEMPTION_ITERATIONS",
                defaults.max_redemption_iterations,
                "must be a valid usize",
            )?,
        };

        if params.max_walk_steps == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_WALK_STEPS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if !collateral_price.is_positive() {
            return Err(ConfigError::InvalidValue(
                "COLLATERAL_PRICE".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Config {
            port,
            collateral_price,
            params,
        })
    }
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expectation: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expectation.to_string())),
        None => Ok(default),
    }
}

fn parse_decimal_or(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Decimal,
) -> Result<Decimal, ConfigError> {
    let value = parse_or(env_map, key, default, "must be a decimal number")?;
    if value.is_negative() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(value)
}
