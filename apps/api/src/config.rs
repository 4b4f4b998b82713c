//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file is honoured in development (loaded in `main`).

use std::env;
use std::path::PathBuf;

use arnica_core::checkout::FeeSchedule;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Directory uploaded files (prescription documents, images) land in
    pub upload_dir: PathBuf,

    /// Delivery fee for scheduled deliveries, in cents
    pub delivery_fee_cents: i64,

    /// Delivery fee for urgent deliveries, in cents
    pub urgent_delivery_fee_cents: i64,

    /// Days a prescription may sit unreviewed before the sweep expires it
    pub prescription_pending_ttl_days: i64,

    /// Cron expression for the expiry sweep (seconds-resolution, six fields)
    pub expiry_sweep_schedule: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/arnica.db".to_string()),

            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./data/uploads".to_string())
                .into(),

            delivery_fee_cents: env::var("DELIVERY_FEE_CENTS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DELIVERY_FEE_CENTS".to_string()))?,

            urgent_delivery_fee_cents: env::var("URGENT_DELIVERY_FEE_CENTS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("URGENT_DELIVERY_FEE_CENTS".to_string()))?,

            prescription_pending_ttl_days: env::var("PRESCRIPTION_PENDING_TTL_DAYS")
                .unwrap_or_else(|_| "14".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("PRESCRIPTION_PENDING_TTL_DAYS".to_string())
                })?,

            expiry_sweep_schedule: env::var("EXPIRY_SWEEP_SCHEDULE")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()), // 03:00 daily
        };

        if config.delivery_fee_cents < 0 || config.urgent_delivery_fee_cents < 0 {
            return Err(ConfigError::InvalidValue("delivery fees".to_string()));
        }
        if config.prescription_pending_ttl_days < 1 {
            return Err(ConfigError::InvalidValue(
                "PRESCRIPTION_PENDING_TTL_DAYS".to_string(),
            ));
        }

        Ok(config)
    }

    /// The fee schedule the checkout decision prices against.
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            delivery_fee_cents: self.delivery_fee_cents,
            urgent_delivery_fee_cents: self.urgent_delivery_fee_cents,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
