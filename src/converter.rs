//! Pair routing and rate resolution.
//!
//! Routes a conversion request to the crypto provider, the fiat snapshot
//! provider, or both (the USD bridge), consulting the rate cache first.

use crate::core::RateCache;
use crate::core::error::ConvertError;
use crate::core::rates::{Conversion, CryptoPriceProvider, FiatRateProvider};
use crate::core::vocabulary::{self, CurrencyEntry};
use tracing::debug;

pub struct Converter<C, F> {
    crypto: C,
    fiat: F,
    cache: RateCache,
}

impl<C: CryptoPriceProvider, F: FiatRateProvider> Converter<C, F> {
    pub fn new(crypto: C, fiat: F, cache: RateCache) -> Self {
        Converter {
            crypto,
            fiat,
            cache,
        }
    }

    /// Converts `amount` units of `base` into `quote`, applying
    /// `commission_pct` percent on top.
    ///
    /// Both currency arguments accept anything the vocabulary resolves:
    /// canonical names, ticker codes, or aliases. Cached per-unit rates
    /// short-circuit the network entirely; commission and amount are not
    /// part of the cache key.
    pub async fn convert(
        &self,
        base: &str,
        quote: &str,
        amount: f64,
        commission_pct: f64,
    ) -> Result<Conversion, ConvertError> {
        let base_entry = vocabulary::resolve(base)
            .ok_or_else(|| ConvertError::UnknownCurrency(base.to_string()))?;
        let quote_entry = vocabulary::resolve(quote)
            .ok_or_else(|| ConvertError::UnknownCurrency(quote.to_string()))?;

        let base_code = base_entry.code.to_lowercase();
        let quote_code = quote_entry.code.to_lowercase();
        let markup = 1.0 + commission_pct / 100.0;

        if let Some((rate, observed_at)) = self.cache.get(&base_code, &quote_code).await {
            return Ok(Conversion {
                amount: amount * rate * markup,
                rate_timestamp: Some(observed_at),
            });
        }

        let (raw, timestamp) = match (base_entry.is_crypto(), quote_entry.is_crypto()) {
            (true, true) => self.crypto_to_crypto(&base_code, &quote_code, amount).await?,
            (false, false) => self.fiat_to_fiat(&base_code, &quote_code, amount).await?,
            _ => self.crypto_to_fiat(base_entry, quote_entry, amount).await?,
        };

        let result = raw * markup;

        // Cache the implied per-unit rate. Only a fully successful
        // resolution reaches this point; bridged rates are cached the same
        // way as direct ones. A zero amount leaves the rate undefined.
        let denominator = amount * markup;
        if denominator != 0.0 {
            self.cache
                .put(&base_code, &quote_code, result / denominator)
                .await;
        }

        Ok(Conversion {
            amount: result,
            rate_timestamp: Some(timestamp),
        })
    }

    async fn crypto_to_crypto(
        &self,
        base_code: &str,
        quote_code: &str,
        amount: f64,
    ) -> Result<(f64, i64), ConvertError> {
        let prices = self.crypto.usd_prices(&[base_code, quote_code]).await?;

        let base_usd = prices.get(base_code).copied().ok_or_else(|| {
            ConvertError::UpstreamUnavailable(format!("no USD price for {base_code}"))
        })?;
        let quote_usd = prices.get(quote_code).copied().ok_or_else(|| {
            ConvertError::UpstreamUnavailable(format!("no USD price for {quote_code}"))
        })?;
        if quote_usd == 0.0 {
            return Err(ConvertError::ConversionFailed(format!(
                "zero USD price for {quote_code}"
            )));
        }

        Ok((
            amount * base_usd / quote_usd,
            chrono::Utc::now().timestamp(),
        ))
    }

    async fn crypto_to_fiat(
        &self,
        base: &'static CurrencyEntry,
        quote: &'static CurrencyEntry,
        amount: f64,
    ) -> Result<(f64, i64), ConvertError> {
        let (crypto_entry, fiat_entry) = if base.is_crypto() {
            (base, quote)
        } else {
            (quote, base)
        };
        let crypto_code = crypto_entry.code.to_lowercase();
        let fiat_code = fiat_entry.code.to_lowercase();

        match self.crypto.direct_quote(&crypto_code, &fiat_code).await? {
            Some(rate) => {
                let result = if base.is_crypto() {
                    amount * rate
                } else {
                    if rate == 0.0 {
                        return Err(ConvertError::ConversionFailed(format!(
                            "zero {fiat_code} price for {crypto_code}"
                        )));
                    }
                    amount / rate
                };
                Ok((result, chrono::Utc::now().timestamp()))
            }
            None => {
                debug!(
                    "No direct {}/{} quote, bridging through USD",
                    crypto_code, fiat_code
                );
                self.bridge_through_usd(base, quote, amount).await
            }
        }
    }

    async fn fiat_to_fiat(
        &self,
        base_code: &str,
        quote_code: &str,
        amount: f64,
    ) -> Result<(f64, i64), ConvertError> {
        let snapshot = self.fiat.snapshot().await?;

        let base_rate = snapshot.rate(base_code).ok_or_else(|| {
            ConvertError::UpstreamUnavailable(format!("{base_code} missing from rate snapshot"))
        })?;
        let quote_rate = snapshot.rate(quote_code).ok_or_else(|| {
            ConvertError::UpstreamUnavailable(format!("{quote_code} missing from rate snapshot"))
        })?;

        Ok((amount / base_rate * quote_rate, snapshot.timestamp))
    }

    /// Fallback for crypto/fiat pairs without a direct quote: resolve
    /// base→USD and USD→quote independently and compose. An unmapped fiat
    /// ticker silently defaults to rate 1, so bridged results are
    /// lower-confidence than direct ones.
    async fn bridge_through_usd(
        &self,
        base: &'static CurrencyEntry,
        quote: &'static CurrencyEntry,
        amount: f64,
    ) -> Result<(f64, i64), ConvertError> {
        let (base_to_usd, base_ts) = if base.is_crypto() {
            self.usd_price_of(base).await?
        } else {
            let snapshot = self.fiat.snapshot().await?;
            let rate = snapshot.rate(&base.code.to_lowercase()).unwrap_or(1.0);
            (1.0 / rate, snapshot.timestamp)
        };

        let (usd_to_quote, quote_ts) = if quote.is_crypto() {
            let (price, ts) = self.usd_price_of(quote).await?;
            if price == 0.0 {
                return Err(ConvertError::ConversionFailed(format!(
                    "zero USD price for {}",
                    quote.code
                )));
            }
            (1.0 / price, ts)
        } else {
            let snapshot = self.fiat.snapshot().await?;
            let rate = snapshot.rate(&quote.code.to_lowercase()).unwrap_or(1.0);
            (rate, snapshot.timestamp)
        };

        Ok((
            amount * base_to_usd * usd_to_quote,
            base_ts.max(quote_ts),
        ))
    }

    async fn usd_price_of(&self, entry: &'static CurrencyEntry) -> Result<(f64, i64), ConvertError> {
        let code = entry.code.to_lowercase();
        let prices = self.crypto.usd_prices(&[&code]).await?;
        let price = prices.get(&code).copied().ok_or_else(|| {
            ConvertError::UpstreamUnavailable(format!("no USD price for {code}"))
        })?;
        Ok((price, chrono::Utc::now().timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::FiatSnapshot;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockCryptoProvider {
        usd: HashMap<String, f64>,
        direct: HashMap<(String, String), f64>,
        call_count: AtomicUsize,
    }

    impl MockCryptoProvider {
        fn new(usd: &[(&str, f64)], direct: &[(&str, &str, f64)]) -> Self {
            Self {
                usd: usd.iter().map(|(c, p)| (c.to_string(), *p)).collect(),
                direct: direct
                    .iter()
                    .map(|(c, v, p)| ((c.to_string(), v.to_string()), *p))
                    .collect(),
                call_count: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<'a> CryptoPriceProvider for &'a MockCryptoProvider {
        async fn usd_prices(&self, codes: &[&str]) -> Result<HashMap<String, f64>, ConvertError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(codes
                .iter()
                .filter_map(|c| self.usd.get(*c).map(|p| (c.to_string(), *p)))
                .collect())
        }

        async fn direct_quote(&self, code: &str, vs: &str) -> Result<Option<f64>, ConvertError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.direct.get(&(code.to_string(), vs.to_string())).copied())
        }
    }

    struct MockFiatProvider {
        rates: HashMap<String, f64>,
        timestamp: i64,
        call_count: AtomicUsize,
    }

    impl MockFiatProvider {
        fn new(rates: &[(&str, f64)], timestamp: i64) -> Self {
            Self {
                rates: rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
                timestamp,
                call_count: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<'a> FiatRateProvider for &'a MockFiatProvider {
        async fn snapshot(&self) -> Result<FiatSnapshot, ConvertError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(FiatSnapshot {
                rates: self.rates.clone(),
                timestamp: self.timestamp,
            })
        }
    }

    fn converter<'a>(
        crypto: &'a MockCryptoProvider,
        fiat: &'a MockFiatProvider,
    ) -> Converter<&'a MockCryptoProvider, &'a MockFiatProvider> {
        Converter::new(crypto, fiat, RateCache::new())
    }

    #[tokio::test]
    async fn test_crypto_to_crypto() {
        let crypto = MockCryptoProvider::new(&[("btc", 50000.0), ("eth", 2500.0)], &[]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        let result = converter.convert("BTC", "ETH", 1.0, 0.0).await.unwrap();
        assert_eq!(result.amount, 20.0);
        assert!(result.rate_timestamp.is_some());
        assert_eq!(fiat.calls(), 0);
    }

    #[tokio::test]
    async fn test_fiat_to_fiat_uses_snapshot_timestamp() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let result = converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();
        assert_eq!(result.amount, 9000.0);
        assert_eq!(result.rate_timestamp, Some(1700000000));
        assert_eq!(crypto.calls(), 0);
    }

    #[tokio::test]
    async fn test_accepts_aliases_and_canonical_names() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let result = converter
            .convert("бакс", "Рубль", 100.0, 0.0)
            .await
            .unwrap();
        assert_eq!(result.amount, 9000.0);
    }

    #[tokio::test]
    async fn test_cache_idempotence_single_upstream_call() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let first = converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();
        let second = converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();

        assert_eq!(fiat.calls(), 1);
        assert_eq!(second.amount, first.amount);
    }

    #[tokio::test]
    async fn test_cache_key_is_not_symmetric() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();
        let reverse = converter.convert("RUB", "USD", 9000.0, 0.0).await.unwrap();

        assert_eq!(fiat.calls(), 2);
        assert!((reverse.amount - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_commission_scaling() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let plain = converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();
        let with_fee = converter.convert("USD", "RUB", 100.0, 5.0).await.unwrap();

        assert!((with_fee.amount - plain.amount * 1.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_crypto_to_fiat_direct_quote() {
        let crypto = MockCryptoProvider::new(&[], &[("btc", "rub", 5_000_000.0)]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        let result = converter.convert("BTC", "RUB", 2.0, 0.0).await.unwrap();
        assert_eq!(result.amount, 10_000_000.0);
        assert_eq!(fiat.calls(), 0);
    }

    #[tokio::test]
    async fn test_fiat_to_crypto_divides_by_direct_quote() {
        let crypto = MockCryptoProvider::new(&[], &[("btc", "rub", 5_000_000.0)]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        let result = converter
            .convert("RUB", "BTC", 10_000_000.0, 0.0)
            .await
            .unwrap();
        assert_eq!(result.amount, 2.0);
    }

    #[tokio::test]
    async fn test_bridge_fallback_when_direct_quote_absent() {
        // No direct btc/rub quote; bridge composes btc→USD and USD→rub.
        let crypto = MockCryptoProvider::new(&[("btc", 50000.0)], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let result = converter.convert("BTC", "RUB", 1.0, 0.0).await.unwrap();
        assert_eq!(result.amount, 4_500_000.0);
        // Bridge reports the later of the two leg timestamps; the crypto
        // leg is wall clock, well past the snapshot timestamp.
        assert!(result.rate_timestamp.unwrap() > 1700000000);
    }

    #[tokio::test]
    async fn test_bridge_fiat_to_crypto() {
        let crypto = MockCryptoProvider::new(&[("eth", 2500.0)], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        // 225000 RUB → 2500 USD → 1 ETH
        let result = converter
            .convert("RUB", "ETH", 225_000.0, 0.0)
            .await
            .unwrap();
        assert!((result.amount - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_bridge_defaults_unmapped_fiat_rate_to_one() {
        let crypto = MockCryptoProvider::new(&[("btc", 50000.0)], &[]);
        // Snapshot lacks BYN entirely.
        let fiat = MockFiatProvider::new(&[("USD", 1.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let result = converter.convert("BTC", "BYN", 1.0, 0.0).await.unwrap();
        assert_eq!(result.amount, 50000.0);
    }

    #[tokio::test]
    async fn test_unknown_currency() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        let err = converter
            .convert("Zorkmid", "USD", 1.0, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnknownCurrency(_)));
    }

    #[tokio::test]
    async fn test_missing_price_is_upstream_unavailable() {
        let crypto = MockCryptoProvider::new(&[("btc", 50000.0)], &[]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        let err = converter.convert("BTC", "ETH", 1.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ConvertError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_snapshot_ticker_is_upstream_unavailable() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let err = converter.convert("USD", "RUB", 1.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ConvertError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failed_resolution_is_not_cached() {
        let crypto = MockCryptoProvider::new(&[("btc", 50000.0)], &[]);
        let fiat = MockFiatProvider::new(&[], 0);
        let converter = converter(&crypto, &fiat);

        assert!(converter.convert("BTC", "ETH", 1.0, 0.0).await.is_err());
        assert!(converter.convert("BTC", "ETH", 1.0, 0.0).await.is_err());

        // Both attempts reached the provider; nothing was cached.
        assert_eq!(crypto.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_amount_is_not_cached() {
        let crypto = MockCryptoProvider::new(&[], &[]);
        let fiat = MockFiatProvider::new(&[("USD", 1.0), ("RUB", 90.0)], 1700000000);
        let converter = converter(&crypto, &fiat);

        let zero = converter.convert("USD", "RUB", 0.0, 0.0).await.unwrap();
        assert_eq!(zero.amount, 0.0);

        // The implied per-unit rate is undefined at zero, so the second
        // call resolves upstream again.
        converter.convert("USD", "RUB", 100.0, 0.0).await.unwrap();
        assert_eq!(fiat.calls(), 2);
    }
}
