//! Rate provider abstractions and conversion result types

use crate::core::error::ConvertError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a conversion: the converted amount and the timestamp of the
/// rate used. The timestamp is epoch seconds; `None` when the provider did
/// not report one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: f64,
    pub rate_timestamp: Option<i64>,
}

/// A full USD-based fiat rate snapshot: ticker code (uppercase) to rate,
/// plus the provider-published timestamp. The snapshot timestamp, not the
/// wall clock, is authoritative for fiat/fiat conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiatSnapshot {
    pub rates: HashMap<String, f64>,
    pub timestamp: i64,
}

impl FiatSnapshot {
    /// Rate for a ticker code, case-insensitive on the caller side.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }
}

/// Upstream source of crypto prices.
#[async_trait]
pub trait CryptoPriceProvider: Send + Sync {
    /// USD prices for several ticker codes in one batched request.
    /// The returned map is keyed by lowercase ticker code; tickers the
    /// provider did not price are simply absent.
    async fn usd_prices(&self, codes: &[&str]) -> Result<HashMap<String, f64>, ConvertError>;

    /// Price of one crypto quoted directly in `vs` (a fiat ticker code).
    /// `Ok(None)` means the provider answered but has no direct quote for
    /// that pair — the caller may fall back to bridging through USD.
    async fn direct_quote(&self, code: &str, vs: &str) -> Result<Option<f64>, ConvertError>;
}

/// Upstream source of fiat rates.
#[async_trait]
pub trait FiatRateProvider: Send + Sync {
    async fn snapshot(&self) -> Result<FiatSnapshot, ConvertError>;
}
