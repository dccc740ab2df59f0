//! Display formatting for money and calendar dates.
//!
//! Amounts are whole units of the smallest currency denomination and are
//! always shown without fractional digits.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "id-ID")]
    IdId,
    #[serde(rename = "en-US")]
    EnUs,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported locale `{0}` (expected id-ID|en-US)")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Self::IdId => "id-ID",
            Self::EnUs => "en-US",
        }
    }

    fn group_separator(self) -> char {
        match self {
            Self::IdId => '.',
            Self::EnUs => ',',
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "id-id" | "id" => Ok(Self::IdId),
            "en-us" | "en" => Ok(Self::EnUs),
            _ => Err(UnsupportedLocale(value.trim().to_string())),
        }
    }
}

const MONTHS_ID: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des"];
const MONTHS_EN: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

fn group_digits(amount: u64, separator: char) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}

fn currency_symbol(currency: &str, locale: Locale) -> Option<&'static str> {
    match (currency, locale) {
        ("IDR", Locale::IdId) => Some("Rp"),
        ("USD", Locale::EnUs) => Some("$"),
        _ => None,
    }
}

/// `Rp 1.500.000.000` for id-ID, `IDR 1,500,000,000` for en-US.
pub fn format_currency(amount: u64, currency: &str, locale: Locale) -> String {
    let currency = currency.trim().to_ascii_uppercase();
    let digits = group_digits(amount, locale.group_separator());
    match currency_symbol(&currency, locale) {
        Some("$") => format!("${digits}"),
        Some(symbol) => format!("{symbol} {digits}"),
        None => format!("{currency} {digits}"),
    }
}

/// `1 Des 2025` for id-ID, `Dec 1, 2025` for en-US.
pub fn format_short_date(date: NaiveDate, locale: Locale) -> String {
    let month = date.month0() as usize;
    match locale {
        Locale::IdId => format!("{} {} {}", date.day(), MONTHS_ID[month], date.year()),
        Locale::EnUs => format!("{} {}, {}", MONTHS_EN[month], date.day(), date.year()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_currency, format_short_date, Locale};

    #[test]
    fn formats_rupiah_without_fraction_digits() {
        assert_eq!(format_currency(1_500_000_000, "IDR", Locale::IdId), "Rp 1.500.000.000");
        assert_eq!(format_currency(45_000_000, "idr", Locale::IdId), "Rp 45.000.000");
        assert_eq!(format_currency(0, "IDR", Locale::IdId), "Rp 0");
        assert_eq!(format_currency(999, "IDR", Locale::IdId), "Rp 999");
        assert_eq!(format_currency(1_000, "IDR", Locale::IdId), "Rp 1.000");
    }

    #[test]
    fn english_locale_uses_comma_grouping() {
        assert_eq!(format_currency(125_000_000, "IDR", Locale::EnUs), "IDR 125,000,000");
        assert_eq!(format_currency(12_345, "USD", Locale::EnUs), "$12,345");
    }

    #[test]
    fn short_dates_follow_the_locale() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).expect("valid date");
        assert_eq!(format_short_date(date, Locale::IdId), "1 Des 2025");
        assert_eq!(format_short_date(date, Locale::EnUs), "Dec 1, 2025");
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!("id-ID".parse::<Locale>(), Ok(Locale::IdId));
        assert_eq!("en_us".parse::<Locale>(), Ok(Locale::EnUs));
        assert!("fr-FR".parse::<Locale>().is_err());
    }
}
