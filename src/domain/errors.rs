use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the quote and rate providers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketDataError {
    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    #[error("Rates unavailable for base {base}: {reason}")]
    RateUnavailable { base: String, reason: String },
}

impl MarketDataError {
    pub fn quote(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QuoteUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn rate(base: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RateUnavailable {
            base: base.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to the durable watchlist copy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Failed to save watchlist for {user_id}: {reason}")]
    WriteFailed { user_id: String, reason: String },

    #[error("Failed to load watchlist for {user_id}: {reason}")]
    LoadFailed { user_id: String, reason: String },
}

/// Errors related to session gating
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No authenticated user: watchlist operations are unavailable")]
    NotSignedIn,

    #[error("Session already active for {user_id}")]
    AlreadySignedIn { user_id: String },
}

/// Errors raised by watchlist edits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors raised while building a conversion request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Conversion amount must not be negative: {amount}")]
    NegativeAmount { amount: Decimal },

    #[error("Invalid currency code: {code:?}")]
    InvalidCurrency { code: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_data_error_formatting() {
        let err = MarketDataError::quote("005930.KS", "missing previous close");
        let msg = err.to_string();
        assert!(msg.contains("005930.KS"));
        assert!(msg.contains("missing previous close"));

        let err = MarketDataError::rate("USD", "status 503");
        assert!(err.to_string().contains("USD"));
    }

    #[test]
    fn test_conversion_error_formatting() {
        let err = ConversionError::NegativeAmount { amount: dec!(-5) };
        assert!(err.to_string().contains("-5"));
    }
}
