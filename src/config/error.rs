//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Bind address must be an IP:port pair")]
    InvalidSocketAddr,

    #[error("Timeout out of range")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be at least 1")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (50)")]
    PoolSizeTooLarge,

    #[error("Database acquire timeout must be shorter than the request timeout")]
    AcquireTimeoutExceedsRequestTimeout,

    #[error("Webhook secret must be at least 16 characters")]
    WebhookSecretTooShort,

    #[error("Webhook max age must be positive")]
    InvalidWebhookMaxAge,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid Resend base URL")]
    InvalidResendUrl,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Notification queue capacity must be positive")]
    InvalidQueueCapacity,
}
