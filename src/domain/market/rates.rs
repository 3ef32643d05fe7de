use crate::domain::errors::ConversionError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Validate and upper-case an ISO-4217 style currency code.
pub fn normalize_currency(code: &str) -> Result<String, ConversionError> {
    let code = code.trim().to_uppercase();
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ConversionError::InvalidCurrency { code })
    }
}

/// Rates quoted against one base currency: `1 base = rate × target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: HashMap<String, Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl RateTable {
    pub fn new(base: impl Into<String>, rates: HashMap<String, Decimal>) -> Self {
        Self {
            base: base.into(),
            rates,
            fetched_at: Utc::now(),
        }
    }

    /// Rate for `code`. The base itself is always 1, listed or not.
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        if code == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(code).copied()
    }

    pub fn currencies(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        if !self.rates.contains_key(&self.base) {
            codes.push(self.base.clone());
        }
        codes.sort();
        codes
    }
}
