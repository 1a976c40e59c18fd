//! # City Extraction
//!
//! File: cli/src/assistant/city.rs
//!
//! Derives a candidate city name from prompt tokens. For a weather query the
//! city span starts after the first preposition that follows the "weather"
//! keyword (or right after the keyword when there is none). The span is then
//! cleaned: one leading article is dropped, every character that is not a
//! letter or whitespace is removed, and the result is trimmed.
//!
//! An empty candidate means extraction failed and no lookup should be made.
//!
use once_cell::sync::Lazy;
use regex::Regex;

const PREPOSITIONS: &[&str] = &["in", "for", "of", "about", "at"];

/// At most one leading article, word-bounded, plus the whitespace after it.
static LEADING_ARTICLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\b(?:a|the|an)\b\s*").expect("article pattern is valid"));

/// Extracts the city candidate of a weather query.
///
/// `tokens` are the prompt tokens and `keyword_index` the position of the
/// "weather" token within them. Prepositions are matched case-insensitively
/// so original-case tokens can be passed in.
pub fn extract_weather_city(tokens: &[String], keyword_index: usize) -> String {
    let after_keyword = keyword_index + 1;
    let start = tokens
        .iter()
        .enumerate()
        .skip(after_keyword)
        .find(|(_, token)| PREPOSITIONS.contains(&token.to_lowercase().as_str()))
        .map_or(after_keyword, |(index, _)| index + 1);

    match tokens.get(start..) {
        Some(span) if !span.is_empty() => clean_city(&span.join(" ")),
        _ => String::new(),
    }
}

/// Cleans a raw city span. See the module docs for the steps.
pub fn clean_city(raw: &str) -> String {
    let without_article = LEADING_ARTICLE_RE.replace(raw.trim(), "");
    without_article
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }

    fn extract(raw: &str) -> String {
        let toks = tokens(raw);
        let keyword_index = toks
            .iter()
            .position(|t| t.eq_ignore_ascii_case("weather"))
            .expect("test prompt contains the keyword");
        extract_weather_city(&toks, keyword_index)
    }

    #[test]
    fn test_preposition_and_article() {
        assert_eq!(extract("weather in the Paris"), "Paris");
        assert_eq!(extract("weather for London"), "London");
        assert_eq!(extract("What's the WEATHER like AT the Hague?"), "Hague");
        assert_eq!(extract("weather about an Oslo"), "Oslo");
    }

    #[test]
    fn test_no_preposition_uses_text_after_keyword() {
        assert_eq!(extract("weather Berlin today"), "Berlin today");
        assert_eq!(extract("tell me the weather new york!!"), "new york");
    }

    #[test]
    fn test_preposition_before_keyword_is_ignored() {
        assert_eq!(extract("in weather Madrid"), "Madrid");
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(extract("weather"), "");
        assert_eq!(extract("weather in"), "");
        assert_eq!(extract("weather in 42"), "");
        assert_eq!(extract("weather for the"), "");
    }

    #[test]
    fn test_only_one_article_is_stripped() {
        assert_eq!(clean_city("the the Paris"), "the Paris");
        // Word-bounded: "theater" is not an article.
        assert_eq!(clean_city("Theaterville"), "Theaterville");
        assert_eq!(clean_city("Anchorage"), "Anchorage");
        assert_eq!(clean_city("a-Coruna"), "Coruna");
    }

    #[test]
    fn test_non_letters_removed() {
        assert_eq!(clean_city("São Paulo, BR."), "São Paulo BR");
        assert_eq!(clean_city("  ?? "), "");
    }

    #[test]
    fn test_clean_city_idempotent() {
        for raw in [
            "the Paris",
            "New York!",
            "an   Oslo ",
            "St. Louis",
            "weather-town 9",
            "Rio de Janeiro",
            "a-Coruna",
        ] {
            let once = clean_city(raw);
            assert_eq!(clean_city(&once), once, "raw: {}", raw);
        }
    }
}
