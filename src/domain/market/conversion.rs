use super::instrument::Instrument;
use super::rates::{RateTable, normalize_currency};
use super::round_display;
use crate::domain::errors::ConversionError;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
}

impl ConversionRequest {
    pub fn new(amount: Decimal, from: &str, to: &str) -> Result<Self, ConversionError> {
        if amount < Decimal::ZERO {
            return Err(ConversionError::NegativeAmount { amount });
        }
        Ok(Self {
            amount,
            from: normalize_currency(from)?,
            to: normalize_currency(to)?,
        })
    }

    /// Swap direction, converting `amount` back the other way.
    pub fn reversed(&self, amount: Decimal) -> Self {
        Self {
            amount,
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

/// Outcome of a conversion. A missing rate is never reported as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Converted(Decimal),
    Unavailable { missing: String },
}

impl Conversion {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Conversion::Converted(v) => Some(*v),
            Conversion::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Converted(v) => write!(f, "{:.2}", v),
            Conversion::Unavailable { .. } => write!(f, "N/A"),
        }
    }
}

/// Convert `request.amount` using a table anchored at `table.base`.
///
/// Base → X multiplies by the X rate, X → base divides by it, and a cross
/// pair goes through the base. Full precision until the final rounding.
pub fn convert(request: &ConversionRequest, table: &RateTable) -> Conversion {
    let amount = request.amount;
    let (from, to) = (request.from.as_str(), request.to.as_str());

    if from == to {
        return Conversion::Converted(amount);
    }

    let result = if from == table.base {
        match table.rates.get(to).copied() {
            Some(rate) => amount * rate,
            None => return unavailable(to),
        }
    } else if to == table.base {
        match divisor(table, from) {
            Some(rate) => amount / rate,
            None => return unavailable(from),
        }
    } else {
        let Some(from_rate) = divisor(table, from) else {
            return unavailable(from);
        };
        let Some(to_rate) = table.rates.get(to).copied() else {
            return unavailable(to);
        };
        amount / from_rate * to_rate
    };

    Conversion::Converted(round_display(result))
}

/// Value an instrument's price in `target`, starting from its listing currency.
pub fn value_instrument(instrument: &Instrument, target: &str, table: &RateTable) -> Conversion {
    let request = ConversionRequest {
        amount: instrument.price,
        from: instrument.currency().to_string(),
        to: target.to_string(),
    };
    convert(&request, table)
}

fn divisor(table: &RateTable, code: &str) -> Option<Decimal> {
    table.rates.get(code).copied().filter(|r| !r.is_zero())
}

fn unavailable(code: &str) -> Conversion {
    Conversion::Unavailable {
        missing: code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::instrument::PriceUpdate;
    use crate::domain::market::symbol::Market;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn usd_table() -> RateTable {
        RateTable::new(
            "USD",
            HashMap::from([
                ("KRW".to_string(), dec!(1350.00)),
                ("EUR".to_string(), dec!(0.92)),
            ]),
        )
    }

    fn req(amount: Decimal, from: &str, to: &str) -> ConversionRequest {
        ConversionRequest::new(amount, from, to).unwrap()
    }

    #[test]
    fn test_base_to_target_multiplies() {
        let r = convert(&req(dec!(1000), "USD", "KRW"), &usd_table());
        assert_eq!(r, Conversion::Converted(dec!(1350000.00)));
    }

    #[test]
    fn test_target_to_base_divides() {
        let r = convert(&req(dec!(1000), "KRW", "USD"), &usd_table());
        assert_eq!(r, Conversion::Converted(dec!(0.74)));
    }

    #[test]
    fn test_cross_pair_goes_through_base() {
        let r = convert(&req(dec!(100), "EUR", "KRW"), &usd_table());
        assert_eq!(r, Conversion::Converted(dec!(146739.13)));
    }

    #[test]
    fn test_same_currency_is_unchanged() {
        let r = convert(&req(dec!(12.345), "JPY", "JPY"), &usd_table());
        assert_eq!(r, Conversion::Converted(dec!(12.345)));
    }

    #[test]
    fn test_missing_rate_is_unavailable_not_zero() {
        let table = usd_table();
        assert_eq!(
            convert(&req(dec!(10), "USD", "JPY"), &table),
            Conversion::Unavailable { missing: "JPY".to_string() }
        );
        assert_eq!(
            convert(&req(dec!(10), "GBP", "KRW"), &table),
            Conversion::Unavailable { missing: "GBP".to_string() }
        );
        assert_eq!(
            convert(&req(dec!(10), "EUR", "CNY"), &table),
            Conversion::Unavailable { missing: "CNY".to_string() }
        );
        assert_eq!(convert(&req(dec!(10), "USD", "JPY"), &table).to_string(), "N/A");
    }

    #[test]
    fn test_zero_amount_converts_to_zero() {
        let r = convert(&req(Decimal::ZERO, "USD", "KRW"), &usd_table());
        assert_eq!(r.value(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_zero_rate_cannot_be_divided_by() {
        let table = RateTable::new("USD", HashMap::from([("XXX".to_string(), Decimal::ZERO)]));
        assert!(!convert(&req(dec!(5), "XXX", "USD"), &table).is_available());
    }

    #[test]
    fn test_round_trip_recovers_amount() {
        let table = usd_table();
        for (amount, from, to) in [
            (dec!(1234.56), "USD", "KRW"),
            (dec!(250), "EUR", "USD"),
            (dec!(99.99), "USD", "EUR"),
        ] {
            let forward = req(amount, from, to);
            let there = convert(&forward, &table).value().unwrap();
            let back = convert(&forward.reversed(there), &table).value().unwrap();
            assert!((back - amount).abs() <= dec!(0.01), "{from}->{to}: {amount} -> {back}");
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(ConversionRequest::new(dec!(-1), "USD", "KRW").is_err());
        assert!(ConversionRequest::new(dec!(1), "US", "KRW").is_err());
    }

    #[test]
    fn test_value_instrument_uses_listing_currency() {
        let update = PriceUpdate {
            price: dec!(70000),
            previous_close: dec!(69000),
            day_high: dec!(70500),
            day_low: dec!(68800),
            volume: "12000000".to_string(),
            as_of: Utc::now(),
        };
        let samsung = Instrument::new("005930.KS", Market::Domestic, &update);
        let r = value_instrument(&samsung, "USD", &usd_table());
        assert_eq!(r, Conversion::Converted(dec!(51.85)));
    }
}
