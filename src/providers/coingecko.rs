use crate::core::error::ConvertError;
use crate::core::rates::CryptoPriceProvider;
use crate::providers::util::with_retry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Ticker code (lowercase) to the provider's internal asset identifier.
const ASSET_IDS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("ltc", "litecoin"),
    ("usdt", "tether"),
    ("bnb", "binancecoin"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
    ("ada", "cardano"),
    ("dot", "polkadot"),
    ("sol", "solana"),
];

pub fn asset_id(code: &str) -> Option<&'static str> {
    ASSET_IDS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, id)| *id)
}

/// Crypto price client for the CoinGecko simple-price endpoint.
pub struct CoinGeckoProvider {
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.to_string(),
        }
    }

    async fn simple_price(
        &self,
        ids: &str,
        vs_currencies: &str,
    ) -> Result<HashMap<String, HashMap<String, f64>>, ConvertError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url, ids, vs_currencies
        );
        debug!("Requesting crypto prices from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cambio/0.2")
            .timeout(Duration::from_secs(10))
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 2, 500)
            .await
            .map_err(ConvertError::from)?;

        if !response.status().is_success() {
            return Err(ConvertError::UpstreamUnavailable(format!(
                "crypto price provider returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CryptoPriceProvider for CoinGeckoProvider {
    async fn usd_prices(&self, codes: &[&str]) -> Result<HashMap<String, f64>, ConvertError> {
        let ids = codes
            .iter()
            .map(|code| {
                asset_id(code).ok_or_else(|| {
                    ConvertError::ConversionFailed(format!("unsupported crypto asset: {code}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let data = self.simple_price(&ids.join(","), "usd").await?;

        let mut prices = HashMap::new();
        for (code, id) in codes.iter().zip(&ids) {
            if let Some(price) = data.get(*id).and_then(|quotes| quotes.get("usd")) {
                prices.insert(code.to_string(), *price);
            }
        }
        Ok(prices)
    }

    async fn direct_quote(&self, code: &str, vs: &str) -> Result<Option<f64>, ConvertError> {
        let id = asset_id(code).ok_or_else(|| {
            ConvertError::ConversionFailed(format!("unsupported crypto asset: {code}"))
        })?;

        let vs = vs.to_lowercase();
        let data = self.simple_price(id, &vs).await?;

        Ok(data.get(id).and_then(|quotes| quotes.get(&vs)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(
        ids: &str,
        vs_currencies: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", ids))
            .and(query_param("vs_currencies", vs_currencies))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_batched_usd_prices() {
        let mock_response = r#"{
            "bitcoin": {"usd": 50000.0},
            "ethereum": {"usd": 2500.0}
        }"#;
        let mock_server =
            create_mock_server("bitcoin,ethereum", "usd", mock_response, 200).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let prices = provider.usd_prices(&["btc", "eth"]).await.unwrap();

        assert_eq!(prices.get("btc"), Some(&50000.0));
        assert_eq!(prices.get("eth"), Some(&2500.0));
    }

    #[tokio::test]
    async fn test_missing_price_is_absent_not_an_error() {
        let mock_response = r#"{"bitcoin": {"usd": 50000.0}}"#;
        let mock_server =
            create_mock_server("bitcoin,ethereum", "usd", mock_response, 200).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let prices = provider.usd_prices(&["btc", "eth"]).await.unwrap();

        assert_eq!(prices.get("btc"), Some(&50000.0));
        assert!(!prices.contains_key("eth"));
    }

    #[tokio::test]
    async fn test_direct_quote() {
        let mock_response = r#"{"bitcoin": {"rub": 5000000.0}}"#;
        let mock_server = create_mock_server("bitcoin", "rub", mock_response, 200).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let quote = provider.direct_quote("btc", "RUB").await.unwrap();

        assert_eq!(quote, Some(5_000_000.0));
    }

    #[tokio::test]
    async fn test_direct_quote_absent_returns_none() {
        // Provider answered but has no quote in the requested currency.
        let mock_response = r#"{"bitcoin": {}}"#;
        let mock_server = create_mock_server("bitcoin", "byn", mock_response, 200).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let quote = provider.direct_quote("btc", "byn").await.unwrap();

        assert_eq!(quote, None);
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_unavailable() {
        let mock_server = create_mock_server("bitcoin", "usd", "rate limited", 429).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let err = provider.usd_prices(&["btc"]).await.unwrap_err();

        assert!(matches!(err, ConvertError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unsupported_asset() {
        let provider = CoinGeckoProvider::new("http://localhost:0");
        let err = provider.usd_prices(&["xyz"]).await.unwrap_err();

        assert!(matches!(err, ConvertError::ConversionFailed(_)));
    }

    #[test]
    fn test_asset_id_table() {
        assert_eq!(asset_id("btc"), Some("bitcoin"));
        assert_eq!(asset_id("doge"), Some("dogecoin"));
        assert_eq!(asset_id("sol"), Some("solana"));
        assert_eq!(asset_id("xyz"), None);
    }
}
