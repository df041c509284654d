/// Query expansion with a fixed space-biology abbreviation/synonym table.

use regex::Regex;
use std::sync::LazyLock;

/// (key, appended text) in the order the keys are tested.
pub const QUERY_EXPANSIONS: &[(&str, &str)] = &[
    ("ISS", "International Space Station"),
    ("EVA", "extravehicular activity spacewalk"),
    ("NASA", "National Aeronautics Space Administration"),
    ("microgravity", "microgravity zero gravity weightlessness"),
    ("astronaut", "astronaut crew member space traveler"),
    ("bone loss", "bone density osteoporosis skeletal"),
    ("muscle", "muscle atrophy muscular skeletal"),
    ("plant", "plant biology botany vegetation"),
    ("cell", "cell biology cellular molecular"),
    ("experiment", "experiment investigation study research"),
    ("radiation", "radiation cosmic rays space radiation"),
    ("psychology", "psychology mental health behavioral"),
];

static EXPANSION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    QUERY_EXPANSIONS
        .iter()
        .filter_map(|(key, expansion)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(key)))
                .ok()
                .map(|re| (re, *expansion))
        })
        .collect()
});

/// Append dictionary expansions for every key found as a whole word.
///
/// Keys are matched case-insensitively against the string as it grows, so an
/// expansion appended earlier can trigger a later key.
pub fn expand_query(query: &str) -> String {
    let mut expanded = query.to_string();
    for (pattern, expansion) in EXPANSION_PATTERNS.iter() {
        if pattern.is_match(&expanded) {
            expanded.push(' ');
            expanded.push_str(expansion);
        }
    }
    expanded
}

/// Lowercase words longer than two characters.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expansion_returns_original() {
        assert_eq!(expand_query("arabidopsis roots"), "arabidopsis roots");
        assert_eq!(expand_query(""), "");
    }

    #[test]
    fn test_abbreviation_is_expanded_case_insensitively() {
        assert_eq!(
            expand_query("iss experiments"),
            "iss experiments International Space Station"
        );
    }

    #[test]
    fn test_whole_word_only() {
        // "cellular" and "missions" must not trigger "cell" / "ISS"
        assert_eq!(expand_query("cellular missions"), "cellular missions");
    }

    #[test]
    fn test_multi_word_key() {
        assert_eq!(
            expand_query("Bone Loss"),
            "Bone Loss bone density osteoporosis skeletal"
        );
    }

    #[test]
    fn test_multiple_keys_expand_in_table_order() {
        assert_eq!(
            expand_query("muscle radiation"),
            "muscle radiation muscle atrophy muscular skeletal radiation cosmic rays space radiation"
        );
    }

    #[test]
    fn test_query_words_filters_short_words() {
        assert_eq!(
            query_words("  Effects of  ISS on  DNA "),
            vec!["effects", "iss", "dna"]
        );
    }
}
