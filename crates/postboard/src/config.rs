use std::{env, time::Duration};

use crate::storage::TransferStrategy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything but "json" is text.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table name (default: "postboard")
    pub table_name: String,
    /// Local DynamoDB endpoint. When set, dummy credentials are used and the
    /// table is created on startup.
    pub local_endpoint: Option<String>,
    /// AWS region (default: "ap-northeast-1")
    pub region: String,
    /// Deadline for a single store call in milliseconds (default: 3000)
    pub store_timeout_ms: u64,
    /// Deadline for a whole request in seconds (default: 10)
    pub request_timeout_secs: u64,
    pub transfer_strategy: TransferStrategy,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMO_TABLE_NAME` - Table name (default: "postboard")
    /// - `DYNAMO_LOCAL_ENDPOINT` - Local DynamoDB endpoint (optional)
    /// - `AWS_REGION` - AWS region (default: "ap-northeast-1")
    /// - `STORE_TIMEOUT_MS` - Per store call deadline (default: 3000)
    /// - `REQUEST_TIMEOUT_SECS` - Per request deadline (default: 10)
    /// - `CLAIM_TRANSFER_STRATEGY` - "claim-first" or "transactional" (default: "claim-first")
    /// - `LOG_FORMAT` - "text" or "json" (default: "text")
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("DYNAMO_TABLE_NAME").unwrap_or_else(|_| "postboard".to_string()),
            local_endpoint: env::var("DYNAMO_LOCAL_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string()),
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3_000),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            transfer_strategy: env::var("CLAIM_TRANSFER_STRATEGY")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(strategy) => Some(strategy),
                    Err(_) => {
                        tracing::warn!(value = %v, "Unknown CLAIM_TRANSFER_STRATEGY, using default");
                        None
                    }
                })
                .unwrap_or_default(),
            log_format: LogFormat::from_env(),
        }
    }

    /// Get the per store call deadline as a Duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Get the per request deadline as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_conversion() {
        let config = Config {
            table_name: "postboard".to_string(),
            local_endpoint: None,
            region: "ap-northeast-1".to_string(),
            store_timeout_ms: 250,
            request_timeout_secs: 5,
            transfer_strategy: TransferStrategy::Transactional,
            log_format: LogFormat::Json,
        };

        assert_eq!(config.store_timeout(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var("DYNAMO_TABLE_NAME");
        env::remove_var("DYNAMO_LOCAL_ENDPOINT");
        env::remove_var("AWS_REGION");
        env::remove_var("STORE_TIMEOUT_MS");
        env::remove_var("REQUEST_TIMEOUT_SECS");
        env::remove_var("CLAIM_TRANSFER_STRATEGY");
        env::remove_var("LOG_FORMAT");

        let config = Config::from_env();

        assert_eq!(config.table_name, "postboard");
        assert_eq!(config.local_endpoint, None);
        assert_eq!(config.region, "ap-northeast-1");
        assert_eq!(config.store_timeout_ms, 3_000);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.transfer_strategy, TransferStrategy::ClaimFirst);
        assert_eq!(config.log_format, LogFormat::Text);
    }
}
