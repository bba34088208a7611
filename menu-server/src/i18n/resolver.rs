//! Locale resolver
//!
//! Picks the translation to show for a requested locale. Fallback chain:
//!
//! 1. exact match
//! 2. base language of the request (`es-ar` -> `es`)
//! 3. configured default locale
//! 4. configured extra fallbacks, in order
//! 5. lowest available locale in lexicographic order
//!
//! A missing or malformed request starts at step 3. An entity without any
//! translation resolves to [`Resolution::Untranslated`].

use std::collections::BTreeMap;

use serde::Serialize;
use shared::Locale;
use shared::types::EntityId;

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub default_locale: Locale,
    pub fallbacks: Vec<Locale>,
}

impl ResolverConfig {
    pub fn new(default_locale: Locale, fallbacks: Vec<Locale>) -> Self {
        Self {
            default_locale,
            fallbacks,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            fallbacks: Vec::new(),
        }
    }
}

/// Which step of the chain produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    BaseLanguage,
    Default,
    Fallback,
    FirstAvailable,
}

/// Resolver outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a, T> {
    Resolved {
        locale: Locale,
        value: &'a T,
        matched: MatchKind,
    },
    Untranslated {
        entity_id: EntityId,
    },
}

impl<'a, T> Resolution<'a, T> {
    pub fn locale(&self) -> Option<&Locale> {
        match self {
            Resolution::Resolved { locale, .. } => Some(locale),
            Resolution::Untranslated { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&'a T> {
        match self {
            Resolution::Resolved { value, .. } => Some(value),
            Resolution::Untranslated { .. } => None,
        }
    }

    pub fn matched(&self) -> Option<MatchKind> {
        match self {
            Resolution::Resolved { matched, .. } => Some(*matched),
            Resolution::Untranslated { .. } => None,
        }
    }
}

/// Stateless resolver bound to a [`ResolverConfig`]
#[derive(Debug, Clone, Default)]
pub struct LocaleResolver {
    config: ResolverConfig,
}

impl LocaleResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `requested` against the locales available for one entity
    pub fn resolve<'a, T>(
        &self,
        entity_id: EntityId,
        requested: Option<&str>,
        available: &'a BTreeMap<Locale, T>,
    ) -> Resolution<'a, T> {
        if available.is_empty() {
            tracing::debug!(entity_id, "Entity has no translations");
            return Resolution::Untranslated { entity_id };
        }

        let requested = requested.and_then(|raw| match Locale::parse(raw) {
            Ok(locale) => Some(locale),
            Err(e) => {
                tracing::debug!(entity_id, error = %e, "Ignoring malformed requested locale");
                None
            }
        });

        let hit = |locale: &Locale, matched: MatchKind| {
            available
                .get_key_value(locale)
                .map(|(locale, value)| Resolution::Resolved {
                    locale: locale.clone(),
                    value,
                    matched,
                })
        };

        if let Some(requested) = &requested {
            if let Some(found) = hit(requested, MatchKind::Exact) {
                return found;
            }
            if let Some(base) = requested.base()
                && let Some(found) = hit(&base, MatchKind::BaseLanguage)
            {
                return found;
            }
        }

        if let Some(found) = hit(&self.config.default_locale, MatchKind::Default) {
            return found;
        }

        for fallback in &self.config.fallbacks {
            if let Some(found) = hit(fallback, MatchKind::Fallback) {
                return found;
            }
        }

        // BTreeMap iterates in key order, so the first entry is the lowest locale
        match available.iter().next() {
            Some((locale, value)) => Resolution::Resolved {
                locale: locale.clone(),
                value,
                matched: MatchKind::FirstAvailable,
            },
            None => Resolution::Untranslated { entity_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn available(codes: &[&str]) -> BTreeMap<Locale, String> {
        codes
            .iter()
            .map(|c| (loc(c), format!("name-{c}")))
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let resolver = LocaleResolver::default();
        let translations = available(&["en", "es"]);
        let res = resolver.resolve(1, Some("es"), &translations);
        assert_eq!(res.locale(), Some(&loc("es")));
        assert_eq!(res.matched(), Some(MatchKind::Exact));
        assert_eq!(res.value().map(String::as_str), Some("name-es"));
    }

    #[test]
    fn test_falls_back_to_default() {
        let resolver = LocaleResolver::default();
        let translations = available(&["en", "es"]);
        let res = resolver.resolve(1, Some("fr"), &translations);
        assert_eq!(res.locale(), Some(&loc("en")));
        assert_eq!(res.matched(), Some(MatchKind::Default));
    }

    #[test]
    fn test_first_available_when_default_missing() {
        let resolver = LocaleResolver::default();
        let translations = available(&["es", "de"]);
        let res = resolver.resolve(1, Some("fr"), &translations);
        assert_eq!(res.locale(), Some(&loc("de")));
        assert_eq!(res.matched(), Some(MatchKind::FirstAvailable));
    }

    #[test]
    fn test_base_language() {
        let resolver = LocaleResolver::default();
        let translations = available(&["en", "es"]);
        let res = resolver.resolve(1, Some("es_AR"), &translations);
        assert_eq!(res.locale(), Some(&loc("es")));
        assert_eq!(res.matched(), Some(MatchKind::BaseLanguage));
    }

    #[test]
    fn test_configured_fallbacks_in_order() {
        let resolver = LocaleResolver::new(ResolverConfig::new(
            loc("en"),
            vec![loc("it"), loc("es")],
        ));
        let translations = available(&["de", "es", "it"]);
        let res = resolver.resolve(1, Some("fr"), &translations);
        assert_eq!(res.locale(), Some(&loc("it")));
        assert_eq!(res.matched(), Some(MatchKind::Fallback));
    }

    #[test]
    fn test_missing_or_malformed_request_uses_default() {
        let resolver = LocaleResolver::default();
        let translations = available(&["en", "es"]);
        for requested in [None, Some("not a locale"), Some("")] {
            let res = resolver.resolve(1, requested, &translations);
            assert_eq!(res.locale(), Some(&loc("en")));
            assert_eq!(res.matched(), Some(MatchKind::Default));
        }
    }

    #[test]
    fn test_untranslated_marker() {
        let resolver = LocaleResolver::default();
        let translations: BTreeMap<Locale, String> = BTreeMap::new();
        let res = resolver.resolve(42, Some("en"), &translations);
        assert_eq!(res, Resolution::Untranslated { entity_id: 42 });
    }

    #[test]
    fn test_never_empty_when_translated() {
        let resolver = LocaleResolver::default();
        for codes in [&["zh"][..], &["pt-br", "pt"][..], &["es-419"][..]] {
            let translations = available(codes);
            for requested in [None, Some("en"), Some("pt-pt"), Some("xx")] {
                assert!(resolver.resolve(1, requested, &translations).value().is_some());
            }
        }
    }
}
