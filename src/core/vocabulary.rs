//! Static currency vocabulary and name normalization

/// Currency class used for routing between rate providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyClass {
    Fiat,
    Crypto,
}

/// A supported currency: canonical display name, ticker code, class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyEntry {
    pub name: &'static str,
    pub code: &'static str,
    pub class: CurrencyClass,
}

impl CurrencyEntry {
    pub fn is_crypto(&self) -> bool {
        self.class == CurrencyClass::Crypto
    }
}

/// All supported currencies. Canonical names are unique; codes are unique
/// within this set.
pub const CURRENCIES: &[CurrencyEntry] = &[
    CurrencyEntry {
        name: "Доллар",
        code: "USD",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Евро",
        code: "EUR",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Рубль",
        code: "RUB",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Юань",
        code: "CNY",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Белорусский рубль",
        code: "BYN",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Индийская рупия",
        code: "INR",
        class: CurrencyClass::Fiat,
    },
    CurrencyEntry {
        name: "Биткоин",
        code: "BTC",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Эфириум",
        code: "ETH",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Лайткоин",
        code: "LTC",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Тезер",
        code: "USDT",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Бинанс",
        code: "BNB",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Рипл",
        code: "XRP",
        class: CurrencyClass::Crypto,
    },
    CurrencyEntry {
        name: "Догикоин",
        code: "DOGE",
        class: CurrencyClass::Crypto,
    },
];

/// Alias table: lowercase token or substring -> canonical name. Evaluated
/// front to back; order is part of the contract since the substring pass
/// returns the first containing entry. The substring pass can over-match
/// (a token merely containing an alias resolves to it) — kept as-is.
const ALIASES: &[(&str, &str)] = &[
    // Full Russian names
    ("доллар", "Доллар"),
    ("евро", "Евро"),
    ("рубль", "Рубль"),
    ("юань", "Юань"),
    ("белорусский рубль", "Белорусский рубль"),
    ("индийская рупия", "Индийская рупия"),
    ("биткоин", "Биткоин"),
    ("эфириум", "Эфириум"),
    ("лайткоин", "Лайткоин"),
    ("тезер", "Тезер"),
    ("рипл", "Рипл"),
    ("догикоин", "Догикоин"),
    ("бинанс", "Бинанс"),
    // Ticker codes
    ("usd", "Доллар"),
    ("eur", "Евро"),
    ("rub", "Рубль"),
    ("cny", "Юань"),
    ("byn", "Белорусский рубль"),
    ("inr", "Индийская рупия"),
    ("btc", "Биткоин"),
    ("eth", "Эфириум"),
    ("ltc", "Лайткоин"),
    ("usdt", "Тезер"),
    ("xrp", "Рипл"),
    ("doge", "Догикоин"),
    ("bnb", "Бинанс"),
    // Slang and short forms
    ("бакс", "Доллар"),
    ("баки", "Доллар"),
    ("биток", "Биткоин"),
    ("эфир", "Эфириум"),
    ("лайт", "Лайткоин"),
    ("доги", "Догикоин"),
];

/// Looks up a currency entry by its canonical name.
pub fn entry_for(canonical: &str) -> Option<&'static CurrencyEntry> {
    CURRENCIES.iter().find(|c| c.name == canonical)
}

/// Normalizes free-form input and returns the full currency entry.
pub fn resolve(raw: &str) -> Option<&'static CurrencyEntry> {
    normalize_currency_name(raw).and_then(entry_for)
}

/// Resolves free-form user input to a canonical currency name.
///
/// Matching order: exact alias/ticker match, then the first alias contained
/// in the input as a substring, then a case-insensitive match against the
/// canonical names themselves. Returns `None` when nothing matches.
pub fn normalize_currency_name(raw: &str) -> Option<&'static str> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        return Some(canonical);
    }

    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| name.contains(alias)) {
        return Some(canonical);
    }

    CURRENCIES
        .iter()
        .find(|c| c.name.to_lowercase() == name)
        .map(|c| c.name)
}
