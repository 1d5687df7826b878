use thiserror::Error;

/// Error contract for the conversion engine. Every public operation
/// returns one of these kinds; all are recoverable at the calling boundary.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Rate provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Expression is too short to evaluate")]
    ExpressionTooShort,

    #[error("Cannot parse expression term: {0}")]
    UnparsableTerm(String),

    #[error("Division by zero in expression")]
    DivisionByZero,
}

impl From<reqwest::Error> for ConvertError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConvertError::ConversionFailed(err.to_string())
        } else {
            ConvertError::UpstreamUnavailable(err.to_string())
        }
    }
}
