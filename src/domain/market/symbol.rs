use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to bare 6-digit Korean listing codes (KOSPI).
pub const DOMESTIC_DEFAULT_SUFFIX: &str = ".KS";

/// Exchange suffixes that mark a symbol as domestically listed.
pub const DOMESTIC_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Market an instrument is listed on. Domestic listings are priced in KRW,
/// everything else in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    Domestic,
    Foreign,
}

impl Market {
    pub fn currency(&self) -> &'static str {
        match self {
            Market::Domestic => "KRW",
            Market::Foreign => "USD",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Domestic => write!(f, "DOMESTIC"),
            Market::Foreign => write!(f, "FOREIGN"),
        }
    }
}

/// A provider-ready ticker together with the market it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSymbol {
    pub symbol: String,
    pub market: Market,
}

/// Normalize user input into a lookup symbol.
///
/// Input is trimmed and upper-cased. A bare 6-digit listing code gets the
/// default domestic suffix. Returns `None` for empty input.
pub fn normalize_symbol(raw: &str) -> Option<NormalizedSymbol> {
    let trimmed = raw.trim().to_uppercase();
    if trimmed.is_empty() {
        return None;
    }

    let symbol = if is_listing_code(&trimmed) {
        format!("{}{}", trimmed, DOMESTIC_DEFAULT_SUFFIX)
    } else {
        trimmed
    };

    let market = market_for(&symbol);
    Some(NormalizedSymbol { symbol, market })
}

/// Classify an already-normalized symbol.
pub fn market_for(symbol: &str) -> Market {
    if DOMESTIC_SUFFIXES.iter().any(|s| symbol.ends_with(s)) {
        Market::Domestic
    } else {
        Market::Foreign
    }
}

fn is_listing_code(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_listing_code_gets_domestic_suffix() {
        let n = normalize_symbol("005930").unwrap();
        assert_eq!(n.symbol, "005930.KS");
        assert_eq!(n.market, Market::Domestic);
    }

    #[test]
    fn test_kosdaq_suffix_is_domestic() {
        let n = normalize_symbol(" 035720.kq ").unwrap();
        assert_eq!(n.symbol, "035720.KQ");
        assert_eq!(n.market, Market::Domestic);
    }

    #[test]
    fn test_foreign_symbol_is_uppercased() {
        let n = normalize_symbol("aapl").unwrap();
        assert_eq!(n.symbol, "AAPL");
        assert_eq!(n.market, Market::Foreign);
    }

    #[test]
    fn test_non_six_digit_numbers_are_foreign() {
        assert_eq!(normalize_symbol("12345").unwrap().market, Market::Foreign);
        assert_eq!(normalize_symbol("1234567").unwrap().symbol, "1234567");
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_symbol("   ").is_none());
    }

    #[test]
    fn test_market_currency() {
        assert_eq!(Market::Domestic.currency(), "KRW");
        assert_eq!(Market::Foreign.currency(), "USD");
    }
}
