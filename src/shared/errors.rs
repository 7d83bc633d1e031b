//! Error handling for the application

use thiserror::Error;

/// Price source errors. Every variant degrades to an unavailable quote
/// at the component boundary.
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Unusable response shape: {0}")]
    Decode(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Reasons a proposed alert target is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter a valid number")]
    NotANumber,

    #[error("Target price must be greater than zero")]
    NonPositive,

    #[error("Current price is unavailable, try again shortly")]
    NoReferencePrice,

    #[error("Target must be above the current price for an 'above' alert and below it for a 'below' alert")]
    DirectionInconsistent,

    #[error("Target must be within 50% of the current price")]
    OutOfBand,
}

/// Persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize alerts: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Notification delivery errors
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_user_facing() {
        assert_eq!(
            ValidationError::OutOfBand.to_string(),
            "Target must be within 50% of the current price"
        );
        let app: AppError = ValidationError::NotANumber.into();
        assert_eq!(app.to_string(), "Enter a valid number");
    }
}
