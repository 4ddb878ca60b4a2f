use crate::constants::TOKEN_TTL_SECS;
use crate::core::payouts::{DEFAULT_QUORUM, PayoutPolicy};
use crate::core::services::ServiceSettings;
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub default_quorum: usize,
    pub payout_ttl_hours: Option<i64>,
    pub bcrypt_cost: u32,
    pub balance_cache_ttl_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl_secs", &self.jwt_ttl_secs)
            .field("default_quorum", &self.default_quorum)
            .field("payout_ttl_hours", &self.payout_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("balance_cache_ttl_secs", &self.balance_cache_ttl_secs)
            .finish()
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // Use a secure secret in production
            jwt_ttl_secs: env::var("JWT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(TOKEN_TTL_SECS),
            default_quorum: env::var("DEFAULT_QUORUM")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|q| *q > 0)
                .unwrap_or(DEFAULT_QUORUM),
            payout_ttl_hours: env::var("PAYOUT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|h| *h > 0),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            balance_cache_ttl_secs: env::var("BALANCE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl: chrono::Duration::seconds(self.jwt_ttl_secs),
            bcrypt_cost: self.bcrypt_cost,
            balance_cache_ttl: Duration::from_secs(self.balance_cache_ttl_secs),
            payout_policy: PayoutPolicy {
                default_quorum: self.default_quorum,
                ttl: self.payout_ttl_hours.map(chrono::Duration::hours),
            },
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
