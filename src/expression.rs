//! Flat evaluator for compound currency expressions.
//!
//! Expressions mix amounts and currencies with `+ - * /` and end with an
//! optional target marker (`в` or `to`) naming the output currency, e.g.
//! `100 usd + 50 eur в rub`. Every term is converted to USD and folded
//! strictly left to right in textual order — parentheses are stripped and
//! there is no operator precedence. This is deliberate: the evaluator is a
//! flattening pass, not an expression-tree parser.

use crate::converter::Converter;
use crate::core::error::ConvertError;
use crate::core::rates::{CryptoPriceProvider, FiatRateProvider};
use crate::core::vocabulary::normalize_currency_name;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Operators and target markers, matched case-insensitively anywhere in
    // the text (so a marker letter inside a word also splits, as the input
    // language has always behaved).
    static ref DELIMITER: Regex = Regex::new(r"(?i)[+\-*/]|в|to").unwrap();
    // A term: leading numeric amount, optional trailing currency letters.
    static ref TERM: Regex = Regex::new(r"^([\d.]+)\s*([a-zA-Zа-яА-Я]+)?$").unwrap();
}

/// Outcome of evaluating an expression: the USD subtotal and the canonical
/// target currency. The caller performs the final USD→target conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub total_usd: f64,
    pub target: &'static str,
}

/// Evaluates a compound currency expression to a USD subtotal and a target
/// currency (USD when no marker is present).
pub async fn evaluate<C, F>(
    converter: &Converter<C, F>,
    text: &str,
) -> Result<Evaluation, ConvertError>
where
    C: CryptoPriceProvider,
    F: FiatRateProvider,
{
    let text = text.replace('(', "").replace(')', "");
    let tokens = tokenize(&text);
    if tokens.len() < 3 {
        return Err(ConvertError::ExpressionTooShort);
    }

    let mut total_usd = 0.0;
    let mut current_op = '+';
    let mut target_token: Option<String> = None;

    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_lowercase();
        if lower == "в" || lower == "to" {
            // Everything after the marker is the target currency; earlier
            // tokens are never re-scanned as terms.
            if i + 1 < tokens.len() {
                target_token = Some(tokens[i + 1..].join(" "));
            }
            break;
        }

        if matches!(token.as_str(), "+" | "-" | "*" | "/") {
            current_op = token.chars().next().unwrap_or('+');
            continue;
        }

        let (amount, currency_token) = parse_term(token)?;
        let canonical = normalize_currency_name(&currency_token)
            .ok_or_else(|| ConvertError::UnknownCurrency(currency_token.clone()))?;

        // Sub-terms carry no commission.
        let converted = converter.convert(canonical, "USD", amount, 0.0).await?.amount;

        match current_op {
            '+' => total_usd += converted,
            '-' => total_usd -= converted,
            '*' => total_usd *= converted,
            _ => {
                if converted == 0.0 {
                    return Err(ConvertError::DivisionByZero);
                }
                total_usd /= converted;
            }
        }
    }

    let target_token = target_token.unwrap_or_else(|| "USD".to_string());
    let target = normalize_currency_name(&target_token)
        .ok_or(ConvertError::UnknownCurrency(target_token))?;

    Ok(Evaluation { total_usd, target })
}

/// Splits the text on operators and markers, retaining them as tokens and
/// dropping empty fragments.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in DELIMITER.find_iter(text) {
        let before = text[last..m.start()].trim();
        if !before.is_empty() {
            tokens.push(before.to_string());
        }
        tokens.push(m.as_str().to_string());
        last = m.end();
    }
    let tail = text[last..].trim();
    if !tail.is_empty() {
        tokens.push(tail.to_string());
    }
    tokens
}

/// Interprets one term token as (amount, currency token). A bare number is
/// USD; a bare currency name means one unit of it.
fn parse_term(token: &str) -> Result<(f64, String), ConvertError> {
    if let Some(caps) = TERM.captures(token) {
        let amount: f64 = caps[1]
            .parse()
            .map_err(|_| ConvertError::UnparsableTerm(token.to_string()))?;
        let currency = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "USD".to_string());
        return Ok((amount, currency));
    }

    if normalize_currency_name(token).is_some() {
        return Ok((1.0, token.to_string()));
    }

    Err(ConvertError::UnparsableTerm(token.to_string()))
}
