//! Multi-language content resolution
//!
//! - [`LocaleResolver`] - translation selection with fallback chain
//! - [`requested_locale`] - `?lang=` / `Accept-Language` negotiation

pub mod resolver;

pub use resolver::{LocaleResolver, MatchKind, Resolution, ResolverConfig};

use shared::locale::parse_accept_language;

/// Locale the caller asked for
///
/// An explicit `?lang=` wins, even when malformed (the resolver then falls
/// back to the default). Otherwise the most preferred parseable
/// `Accept-Language` entry is used.
pub fn requested_locale(query: Option<&str>, accept_language: Option<&str>) -> Option<String> {
    if let Some(lang) = query
        && !lang.trim().is_empty()
    {
        return Some(lang.to_string());
    }
    accept_language
        .and_then(|header| parse_accept_language(header).into_iter().next())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wins_over_header() {
        assert_eq!(
            requested_locale(Some("es"), Some("de, en;q=0.5")),
            Some("es".to_string())
        );
    }

    #[test]
    fn test_header_used_without_query() {
        assert_eq!(
            requested_locale(None, Some("fr;q=0.3, de-AT")),
            Some("de-at".to_string())
        );
        assert_eq!(requested_locale(Some(" "), Some("it")), Some("it".to_string()));
        assert_eq!(requested_locale(None, None), None);
    }
}
