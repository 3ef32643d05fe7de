//! The ordered, symbol-unique list of instruments tracked by one user.

use crate::domain::market::instrument::{Instrument, PriceUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Instrument>", into = "Vec<Instrument>")]
pub struct Watchlist {
    instruments: Vec<Instrument>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, dropping later duplicates of a symbol.
    pub fn from_instruments(instruments: Vec<Instrument>) -> Self {
        let mut list = Self::new();
        for instrument in instruments {
            list.add(instrument);
        }
        list
    }

    /// Append `instrument` unless its symbol is already tracked.
    /// Returns whether it was added.
    pub fn add(&mut self, instrument: Instrument) -> bool {
        if self.contains(&instrument.symbol) {
            return false;
        }
        self.instruments.push(instrument);
        true
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.instruments.len();
        self.instruments.retain(|i| i.symbol != symbol);
        self.instruments.len() != before
    }

    /// Apply quote fields to matching symbols; updates for untracked symbols
    /// are ignored. Returns the symbols that were touched, in list order.
    pub fn upsert_prices(&mut self, updates: &HashMap<String, PriceUpdate>) -> Vec<String> {
        let mut applied = Vec::new();
        for instrument in self.instruments.iter_mut() {
            if let Some(update) = updates.get(&instrument.symbol) {
                instrument.apply(update);
                applied.push(instrument.symbol.clone());
            }
        }
        applied
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.iter().any(|i| i.symbol == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.symbol.clone()).collect()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn clear(&mut self) {
        self.instruments.clear();
    }
}

impl From<Vec<Instrument>> for Watchlist {
    fn from(instruments: Vec<Instrument>) -> Self {
        Self::from_instruments(instruments)
    }
}

impl From<Watchlist> for Vec<Instrument> {
    fn from(list: Watchlist) -> Self {
        list.instruments
    }
}
