pub mod coingecko;
pub mod openexchange;
pub mod util;
