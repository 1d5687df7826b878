use crate::core::error::ConvertError;
use crate::core::rates::{FiatRateProvider, FiatSnapshot};
use crate::providers::util::with_retry;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Fiat rate client for the Open Exchange Rates latest-rates endpoint.
/// Rates in the snapshot are USD-based and keyed by uppercase ticker.
pub struct OpenExchangeRatesProvider {
    base_url: String,
    app_id: String,
}

impl OpenExchangeRatesProvider {
    pub fn new(base_url: &str, app_id: &str) -> Self {
        OpenExchangeRatesProvider {
            base_url: base_url.to_string(),
            app_id: app_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
    timestamp: i64,
}

#[async_trait]
impl FiatRateProvider for OpenExchangeRatesProvider {
    async fn snapshot(&self) -> Result<FiatSnapshot, ConvertError> {
        let url = format!("{}/api/latest.json?app_id={}", self.base_url, self.app_id);
        debug!("Requesting fiat rate snapshot from {}", self.base_url);

        let client = reqwest::Client::builder()
            .user_agent("cambio/0.2")
            .timeout(Duration::from_secs(10))
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 2, 500)
            .await
            .map_err(ConvertError::from)?;

        if !response.status().is_success() {
            return Err(ConvertError::UpstreamUnavailable(format!(
                "fiat rate provider returned {}",
                response.status()
            )));
        }

        let text = response.text().await?;

        // A response without `rates` or `timestamp` breaks the provider
        // contract, so it counts as an upstream failure rather than a
        // local parse bug.
        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            ConvertError::UpstreamUnavailable(format!("malformed rate snapshot: {e}"))
        })?;

        Ok(FiatSnapshot {
            rates: data.rates,
            timestamp: data.timestamp,
        })
    }
}
