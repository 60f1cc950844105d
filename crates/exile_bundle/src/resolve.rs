//! Language-aware resolution of logical file paths.
//!
//! English files live directly under `data/`; every other language gets a
//! lowercased subdirectory (`data/french/...`). A request for a localized
//! file tries each configured language in order and quietly falls back to
//! the English base file when no override exists.

use crate::error::{Error, Result};

/// The default language; its files carry no subdirectory.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Every language the game ships data for.
pub const LANGUAGES: &[&str] = &[
    "English",
    "French",
    "German",
    "Spanish",
    "Portuguese",
    "Russian",
    "Thai",
    "Japanese",
    "Korean",
    "Traditional Chinese",
    "Simplified Chinese",
];

/// Whether `language` is one the game ships.
pub fn is_supported_language(language: &str) -> bool {
    LANGUAGES.contains(&language)
}

/// Validate a configured language list. An empty list is valid and means
/// the English default.
pub fn validate_languages(languages: &[String]) -> Result<()> {
    for language in languages {
        if !is_supported_language(language) {
            return Err(Error::UnsupportedLanguage(language.clone()));
        }
    }
    Ok(())
}

/// Expand a logical path into the ordered list of concrete index paths to
/// try, one per configured language.
///
/// Paths outside `data/` have no localized variants and are returned
/// unchanged as the single candidate.
pub fn candidate_paths(logical: &str, languages: &[String]) -> Vec<String> {
    let lower = logical.to_lowercase();
    let Some(filename) = lower.strip_prefix("data/") else {
        return vec![logical.to_string()];
    };

    languages
        .iter()
        .map(|language| {
            if language == DEFAULT_LANGUAGE {
                format!("data/{filename}")
            } else {
                format!("data/{}/{filename}", language.to_lowercase())
            }
        })
        .collect()
}
