use super::round_display;
use super::symbol::Market;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Volume label used when the provider omits volume.
pub const UNKNOWN_VOLUME: &str = "unknown";

/// Price fields carried by a fresh quote, applied onto a tracked instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub price: Decimal,
    pub previous_close: Decimal,
    pub day_high: Decimal,
    pub day_low: Decimal,
    pub volume: String,
    pub as_of: DateTime<Utc>,
}

/// One tracked equity and its latest known quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub market: Market,
    pub price: Decimal,
    pub previous_close: Decimal,
    /// `None` until a quote with a usable previous close has been seen.
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub day_high: Decimal,
    pub day_low: Decimal,
    pub volume: String,
    pub updated_at: DateTime<Utc>,
}

/// Change and percent change against the previous close, or `None` when the
/// previous close cannot be divided by.
pub fn compute_change(price: Decimal, previous_close: Decimal) -> Option<(Decimal, Decimal)> {
    if previous_close <= Decimal::ZERO {
        return None;
    }
    let change = price - previous_close;
    let pct = round_display(change / previous_close * Decimal::ONE_HUNDRED);
    Some((change, pct))
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, market: Market, update: &PriceUpdate) -> Self {
        let mut instrument = Self {
            symbol: symbol.into(),
            market,
            price: update.price,
            previous_close: update.previous_close,
            change: None,
            change_percent: None,
            day_high: update.day_high,
            day_low: update.day_low,
            volume: update.volume.clone(),
            updated_at: update.as_of,
        };
        instrument.apply(update);
        instrument
    }

    /// Overwrite quote fields. Symbol and market never change.
    ///
    /// A non-positive previous close leaves the change fields (and the stored
    /// previous close) at their last known values.
    pub fn apply(&mut self, update: &PriceUpdate) {
        self.price = update.price;
        self.day_high = update.day_high;
        self.day_low = update.day_low;
        self.volume = update.volume.clone();
        self.updated_at = update.as_of;

        if let Some((change, pct)) = compute_change(update.price, update.previous_close) {
            self.previous_close = update.previous_close;
            self.change = Some(change);
            self.change_percent = Some(pct);
        }
    }

    pub fn currency(&self) -> &'static str {
        self.market.currency()
    }

    pub fn is_positive(&self) -> bool {
        self.change.is_none_or(|c| c >= Decimal::ZERO)
    }

    /// e.g. `"+1.25%"`, `"-0.40%"`, or `"N/A"` when stale.
    pub fn change_percent_label(&self) -> String {
        match self.change_percent {
            Some(pct) if pct >= Decimal::ZERO => format!("+{:.2}%", pct),
            Some(pct) => format!("{:.2}%", pct),
            None => "N/A".to_string(),
        }
    }

    /// Price formatted in the listing currency: whole won, cents for dollars.
    pub fn price_label(&self) -> String {
        match self.market {
            Market::Domestic => format!("₩{:.0}", self.price),
            Market::Foreign => format!("${:.2}", self.price),
        }
    }
}
