//! Locale tags
//!
//! A [`Locale`] is a normalized language tag: a 2-3 letter language subtag,
//! optionally followed by a region subtag (2 letters or 3 digits). Input may
//! use `-` or `_` and any letter case; the stored form is lowercase with `-`
//! (`es_AR` -> `es-ar`). Ordering is plain string ordering of that form.

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Malformed locale code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid locale code: {0:?}")]
pub struct InvalidLocale(pub String);

impl From<InvalidLocale> for AppError {
    fn from(err: InvalidLocale) -> Self {
        AppError::with_message(ErrorCode::InvalidLocale, err.to_string()).with_detail("locale", err.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse and normalize a locale code
    pub fn parse(raw: &str) -> Result<Self, InvalidLocale> {
        let trimmed = raw.trim();
        let invalid = || InvalidLocale(raw.to_string());

        let mut parts = trimmed.split(['-', '_']);
        let language = parts.next().ok_or_else(invalid)?;
        let region = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut normalized = language.to_ascii_lowercase();
        if let Some(region) = region {
            let letters = region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic());
            let digits = region.len() == 3 && region.chars().all(|c| c.is_ascii_digit());
            if !letters && !digits {
                return Err(invalid());
            }
            normalized.push('-');
            normalized.push_str(&region.to_ascii_lowercase());
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language subtag (`es` for `es-ar`)
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// The bare-language locale, when this locale carries a region
    pub fn base(&self) -> Option<Locale> {
        if self.0.contains('-') {
            Some(Self(self.language().to_string()))
        } else {
            None
        }
    }
}

/// `en`
impl Default for Locale {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Locale {
    type Err = InvalidLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = InvalidLocale;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

/// Parse an `Accept-Language` header into locales ordered by preference
///
/// Entries with `q=0`, wildcards and malformed tags are skipped. Equal
/// weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<Locale> {
    let mut weighted: Vec<(Locale, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut pieces = entry.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            if quality <= 0.0 {
                return None;
            }
            Locale::parse(tag).ok().map(|locale| (locale, quality))
        })
        .collect();

    // stable: equal weights keep header order
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = Vec::with_capacity(weighted.len());
    for (locale, _) in weighted {
        if !seen.contains(&locale) {
            seen.push(locale);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(Locale::parse("EN").unwrap().as_str(), "en");
        assert_eq!(Locale::parse("es_AR").unwrap().as_str(), "es-ar");
        assert_eq!(Locale::parse(" pt-BR ").unwrap().as_str(), "pt-br");
        assert_eq!(Locale::parse("es-419").unwrap().as_str(), "es-419");
        assert_eq!(Locale::parse("ast").unwrap().as_str(), "ast");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "e", "english", "e1", "en-", "en-u", "en-12", "en-us-x", "*"] {
            assert!(Locale::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_base_language() {
        let locale = Locale::parse("es-ar").unwrap();
        assert_eq!(locale.language(), "es");
        assert_eq!(locale.base(), Some(Locale::parse("es").unwrap()));
        assert_eq!(Locale::parse("es").unwrap().base(), None);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut locales: Vec<Locale> = ["es", "de", "en-gb", "en"]
            .iter()
            .map(|s| Locale::parse(s).unwrap())
            .collect();
        locales.sort();
        let ordered: Vec<&str> = locales.iter().map(Locale::as_str).collect();
        assert_eq!(ordered, vec!["de", "en", "en-gb", "es"]);
    }

    #[test]
    fn test_serde_as_string_and_map_key() {
        let locale: Locale = serde_json::from_str("\"FR\"").unwrap();
        assert_eq!(serde_json::to_string(&locale).unwrap(), "\"fr\"");
        assert!(serde_json::from_str::<Locale>("\"french\"").is_err());

        let map: std::collections::BTreeMap<Locale, u8> =
            serde_json::from_str(r#"{"es": 1, "EN": 2}"#).unwrap();
        assert_eq!(map.get(&Locale::parse("en").unwrap()), Some(&2));
    }

    #[test]
    fn test_accept_language_orders_by_quality() {
        let prefs = parse_accept_language("fr;q=0.5, es-AR, en;q=0.8, *;q=0.1");
        let codes: Vec<&str> = prefs.iter().map(Locale::as_str).collect();
        assert_eq!(codes, vec!["es-ar", "en", "fr"]);
    }

    #[test]
    fn test_accept_language_skips_garbage_and_zero_weight() {
        let prefs = parse_accept_language("klingon-xx, de;q=0, it");
        let codes: Vec<&str> = prefs.iter().map(Locale::as_str).collect();
        assert_eq!(codes, vec!["it"]);
        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn test_invalid_locale_into_app_error() {
        let err: AppError = Locale::parse("xx-yy-zz").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidLocale);
    }
}
