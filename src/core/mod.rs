//! Core business logic abstractions

pub mod cache;
pub mod error;
pub mod log;
pub mod rates;
pub mod vocabulary;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use error::ConvertError;
pub use rates::{Conversion, CryptoPriceProvider, FiatRateProvider, FiatSnapshot};
pub use vocabulary::{CurrencyClass, CurrencyEntry, normalize_currency_name};
