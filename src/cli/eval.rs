use super::convert::format_timestamp;
use super::ui;
use crate::converter::Converter;
use crate::core::rates::{CryptoPriceProvider, FiatRateProvider};
use crate::core::vocabulary;
use crate::expression;
use anyhow::Result;

pub async fn run<C, F>(converter: &Converter<C, F>, text: &str) -> Result<()>
where
    C: CryptoPriceProvider,
    F: FiatRateProvider,
{
    let evaluation = expression::evaluate(converter, text).await?;

    // The expression reduces to a USD subtotal; one final conversion
    // produces the displayed result.
    let result = converter
        .convert("USD", evaluation.target, evaluation.total_usd, 0.0)
        .await?;

    let target_label = vocabulary::entry_for(evaluation.target)
        .map_or_else(|| evaluation.target.to_string(), |e| {
            format!("{} ({})", e.name, e.code)
        });

    println!("{}", ui::style_text(text.trim(), ui::StyleType::Title));
    println!("Subtotal: {:.6} USD", evaluation.total_usd);
    println!(
        "Result: {} {}",
        ui::style_text(&format!("{:.6}", result.amount), ui::StyleType::TotalValue),
        target_label,
    );
    println!(
        "{}",
        ui::style_text(
            &format!("Rate as of {}", format_timestamp(result.rate_timestamp)),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
