use super::ui;
use crate::converter::Converter;
use crate::core::rates::{CryptoPriceProvider, FiatRateProvider};
use crate::core::vocabulary;
use anyhow::Result;
use chrono::{TimeZone, Utc};

fn currency_label(raw: &str) -> String {
    vocabulary::resolve(raw)
        .map_or_else(|| raw.to_string(), |e| format!("{} ({})", e.name, e.code))
}

pub(super) fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map_or("unknown".to_string(), |dt| {
            dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        })
}

pub async fn run<C, F>(
    converter: &Converter<C, F>,
    base: &str,
    quote: &str,
    amount: f64,
    commission: f64,
) -> Result<()>
where
    C: CryptoPriceProvider,
    F: FiatRateProvider,
{
    let result = converter.convert(base, quote, amount, commission).await?;

    let value = format!("{:.6}", result.amount);
    println!(
        "{} {} = {} {}",
        amount,
        currency_label(base),
        ui::style_text(&value, ui::StyleType::TotalValue),
        currency_label(quote),
    );
    if commission != 0.0 {
        println!("Commission applied: {commission}%");
    }
    println!(
        "{}",
        ui::style_text(
            &format!("Rate as of {}", format_timestamp(result.rate_timestamp)),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
