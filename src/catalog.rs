//! Language catalog: the codes and display names the backend supports.
//!
//! The backend returns a JSON object of `code -> name`. The catalog keeps the
//! pairs in the order they appear on the wire; it never sorts.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// One selectable language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOption {
    /// Language code sent to the backend (e.g., "en", "zh-cn")
    pub code: String,
    /// Human-readable name shown to the user
    pub name: String,
}

/// Languages supported by the backend, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageCatalog {
    languages: Vec<LanguageOption>,
}

impl LanguageCatalog {
    pub fn new(languages: Vec<LanguageOption>) -> Self {
        Self { languages }
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageOption> {
        self.languages.iter()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for LanguageCatalog {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(code, name)| LanguageOption {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        )
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = LanguageCatalog;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of language codes to language names")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut languages = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((code, name)) = access.next_entry::<String, String>()? {
            languages.push(LanguageOption { code, name });
        }
        Ok(LanguageCatalog { languages })
    }
}

impl<'de> Deserialize<'de> for LanguageCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CatalogVisitor)
    }
}
