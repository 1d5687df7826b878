pub mod convert;
pub mod currencies;
pub mod eval;
pub mod ui;
