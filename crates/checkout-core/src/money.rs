//! Currency Conversion
//!
//! Converts USD plan pricing into the charge currency using a fixed rate
//! table, formats amounts for display, and resolves the billing country
//! sent to the payment processor.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// Supported charge currencies
///
/// A closed set: plans carrying any other code are rejected at resolution
/// time instead of being silently priced at a 1:1 rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Inr,
    Aud,
    Cad,
    Jpy,
    Nzd,
    Nok,
    Sek,
    Chf,
}

impl Currency {
    /// Every supported currency, in table order
    pub const ALL: [Currency; 11] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Inr,
        Currency::Aud,
        Currency::Cad,
        Currency::Jpy,
        Currency::Nzd,
        Currency::Nok,
        Currency::Sek,
        Currency::Chf,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Jpy => "JPY",
            Currency::Nzd => "NZD",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
            Currency::Chf => "CHF",
        }
    }

    /// Lowercase code as the backend expects it on the wire
    pub fn wire_code(&self) -> String {
        self.code().to_lowercase()
    }

    /// Exchange rate relative to USD
    pub fn rate(&self) -> Decimal {
        match self {
            Currency::Usd => dec!(1),
            Currency::Eur => dec!(0.93),
            Currency::Gbp => dec!(0.79),
            Currency::Inr => dec!(83.12),
            Currency::Aud => dec!(1.52),
            Currency::Cad => dec!(1.36),
            Currency::Jpy => dec!(149.62),
            Currency::Nzd => dec!(1.66),
            Currency::Nok => dec!(10.65),
            Currency::Sek => dec!(10.75),
            Currency::Chf => dec!(0.89),
        }
    }

    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
            Currency::Aud => "A$",
            Currency::Cad => "C$",
            Currency::Jpy => "¥",
            Currency::Nzd => "NZ$",
            Currency::Nok => "kr",
            Currency::Sek => "kr",
            Currency::Chf => "CHF",
        }
    }

    /// ISO 3166 alpha-2 billing country for processor metadata
    pub fn country_code(&self) -> &'static str {
        match self {
            Currency::Usd => "US",
            Currency::Eur => "DE",
            Currency::Gbp => "GB",
            Currency::Inr => "IN",
            Currency::Aud => "AU",
            Currency::Cad => "CA",
            Currency::Jpy => "JP",
            Currency::Nzd => "NZ",
            Currency::Nok => "NO",
            Currency::Sek => "SE",
            Currency::Chf => "CH",
        }
    }

    /// Whether amounts render without decimal places
    pub fn zero_decimal(&self) -> bool {
        matches!(self, Currency::Jpy)
    }
}

impl FromStr for Currency {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "INR" => Ok(Currency::Inr),
            "AUD" => Ok(Currency::Aud),
            "CAD" => Ok(Currency::Cad),
            "JPY" => Ok(Currency::Jpy),
            "NZD" => Ok(Currency::Nzd),
            "NOK" => Ok(Currency::Nok),
            "SEK" => Ok(Currency::Sek),
            "CHF" => Ok(Currency::Chf),
            other => Err(CheckoutError::UnsupportedCurrency(other.to_string())),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Convert a USD amount into the charge currency
///
/// The result is rounded to two decimals half-away-from-zero; this is the
/// exact amount sent to the backend when creating the payment intent.
pub fn convert(usd_amount: Decimal, currency: Currency) -> Decimal {
    (usd_amount * currency.rate()).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display in the given currency
///
/// Zero-decimal currencies round to a whole amount with symbol prefix;
/// CHF renders with the symbol as a suffix; everything else is symbol
/// prefix with two decimals.
pub fn format(amount: Decimal, currency: Currency) -> String {
    if currency.zero_decimal() {
        let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{whole}", currency.symbol())
    } else if currency == Currency::Chf {
        format!("{amount:.2} {}", currency.symbol())
    } else {
        format!("{}{amount:.2}", currency.symbol())
    }
}
