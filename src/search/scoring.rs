/// Field-weighted relevance scoring for publication records
///
/// Score is a sum of fixed bonuses, all based on case-insensitive substring
/// matching:
///   1. Domain presence: any space-biology term in title, category or tags
///   2. Full query: the whole (expanded) query inside a field
///   3. Per word: each query word inside a field, larger for domain terms
///   4. Multi-match: several query words hitting the title
///
/// Short titles are scaled down afterwards. All functions are pure.

use crate::record::Publication;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Space-biology terms that mark a record as on-topic and raise per-word bonuses.
pub const DOMAIN_TERMS: &[&str] = &[
    "microgravity",
    "space",
    "astronaut",
    "zero gravity",
    "weightlessness",
    "space flight",
    "orbital",
    "space station",
    "space environment",
    "space medicine",
    "cardiovascular",
    "bone",
    "muscle",
    "physiology",
    "biomedical",
    "cell biology",
];

const DOMAIN_PRESENCE_BONUS: f64 = 50.0;

const FULL_QUERY_TITLE: f64 = 150.0;
const FULL_QUERY_CATEGORY: f64 = 120.0;
const FULL_QUERY_TAGS: f64 = 100.0;
const FULL_QUERY_IMPACT: f64 = 80.0;

/// (regular word, domain term) bonus per field
const WORD_TITLE: (f64, f64) = (25.0, 40.0);
const WORD_CATEGORY: (f64, f64) = (20.0, 30.0);
const WORD_TAGS: (f64, f64) = (15.0, 25.0);
const WORD_IMPACT: (f64, f64) = (12.0, 20.0);
const WORD_LINK: f64 = 5.0;

const TITLE_MULTI_MATCH_PER_WORD: f64 = 10.0;

const SHORT_TITLE_CHARS: usize = 20;
const SHORT_TITLE_FACTOR: f64 = 0.8;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Lowercased view of the scored fields of one record.
struct Fields {
    title: String,
    link: String,
    category: String,
    tags: String,
    impact: String,
}

impl Fields {
    fn of(publication: &Publication) -> Self {
        Fields {
            title: publication.title.to_lowercase(),
            link: publication.link.as_deref().unwrap_or_default().to_lowercase(),
            category: publication.category.to_lowercase(),
            tags: publication.tags.joined().to_lowercase(),
            impact: publication.impact.to_lowercase(),
        }
    }
}

pub fn is_domain_term(word: &str) -> bool {
    DOMAIN_TERMS.contains(&word)
}

fn word_bonus(weights: (f64, f64), domain: bool) -> f64 {
    if domain {
        weights.1
    } else {
        weights.0
    }
}

/// Score one record against lowercase query words and the full lowercase query.
///
/// Always returns a non-negative integer.
pub fn score(publication: &Publication, query_words: &[String], full_query: &str) -> i64 {
    let f = Fields::of(publication);
    let mut score = 0.0_f64;

    let on_topic = DOMAIN_TERMS.iter().any(|term| {
        f.title.contains(term) || f.category.contains(term) || f.tags.contains(term)
    });
    if on_topic {
        score += DOMAIN_PRESENCE_BONUS;
    }

    if f.title.contains(full_query) {
        score += FULL_QUERY_TITLE;
    }
    if f.category.contains(full_query) {
        score += FULL_QUERY_CATEGORY;
    }
    if f.tags.contains(full_query) {
        score += FULL_QUERY_TAGS;
    }
    if f.impact.contains(full_query) {
        score += FULL_QUERY_IMPACT;
    }

    for word in query_words {
        let word = word.as_str();
        let domain = is_domain_term(word);
        if f.title.contains(word) {
            score += word_bonus(WORD_TITLE, domain);
        }
        if f.category.contains(word) {
            score += word_bonus(WORD_CATEGORY, domain);
        }
        if f.tags.contains(word) {
            score += word_bonus(WORD_TAGS, domain);
        }
        if f.impact.contains(word) {
            score += word_bonus(WORD_IMPACT, domain);
        }
        if f.link.contains(word) {
            score += WORD_LINK;
        }
    }

    let title_matches = query_words
        .iter()
        .filter(|w| f.title.contains(w.as_str()))
        .count();
    if title_matches > 1 {
        score += title_matches as f64 * TITLE_MULTI_MATCH_PER_WORD;
    }

    if f.title.chars().count() < SHORT_TITLE_CHARS {
        score *= SHORT_TITLE_FACTOR;
    }

    score.round().max(0.0) as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawPublication, Tags};

    fn publication(title: &str, category: &str, tags: &str, impact: &str) -> Publication {
        Publication::from_raw(RawPublication {
            title: Some(title.into()),
            category: Some(category.into()),
            tags: Some(Tags::from(tags)),
            impact: Some(impact.into()),
            ..Default::default()
        })
    }

    fn words(q: &str) -> Vec<String> {
        crate::search::expand::query_words(q)
    }

    #[test]
    fn test_empty_record_scores_zero() {
        let p = Publication::from_raw(RawPublication::default());
        assert_eq!(score(&p, &words("bone density"), "bone density"), 0);
    }

    #[test]
    fn test_single_domain_word_in_long_title() {
        // presence 50 + full query 150 + domain word in title 40
        let p = publication("Bone density changes in rodents after flight", "", "", "");
        assert_eq!(score(&p, &words("bone"), "bone"), 240);
    }

    #[test]
    fn test_short_title_penalty() {
        // (50 + 150 + 40) * 0.8
        let p = publication("Bone study", "", "", "");
        assert_eq!(score(&p, &words("bone"), "bone"), 192);
    }

    #[test]
    fn test_field_weights_for_regular_word() {
        let q = words("arabidopsis");
        let long = "An unrelated but sufficiently long title";
        let in_title = publication("Arabidopsis root growth in orbit habitats", "", "", "");
        let in_category = publication(long, "arabidopsis", "", "");
        let in_tags = publication(long, "", "arabidopsis", "");
        let in_impact = publication(long, "", "", "arabidopsis");

        assert_eq!(score(&in_title, &q, "arabidopsis"), 150 + 25);
        assert_eq!(score(&in_category, &q, "arabidopsis"), 120 + 20);
        assert_eq!(score(&in_tags, &q, "arabidopsis"), 100 + 15);
        assert_eq!(score(&in_impact, &q, "arabidopsis"), 80 + 12);
    }

    #[test]
    fn test_title_multi_match_bonus() {
        let p = publication("Rodent hindlimb unloading and tendon repair", "", "", "");
        // words: rodent, tendon → 25 + 25 + 2 * 10; full query absent
        assert_eq!(score(&p, &words("rodent tendon"), "rodent tendon"), 70);
    }

    #[test]
    fn test_link_match() {
        let mut p = publication("A sufficiently long unrelated title", "", "", "");
        p.link = Some("https://osdr.nasa.gov/tendon".into());
        assert_eq!(score(&p, &words("tendon"), "zzz"), 5);
    }

    #[test]
    fn test_exact_title_beats_partial_impact() {
        let q = words("tendon");
        let title_hit = publication("Tendon remodeling under unloading", "", "", "");
        let impact_hit = publication("An unrelated but sufficiently long title", "", "", "tendon");
        let title_score = score(&title_hit, &q, "tendon");
        let impact_score = score(&impact_hit, &q, "zzz");
        assert!(title_score > impact_score, "{} <= {}", title_score, impact_score);
    }

    #[test]
    fn test_score_is_never_negative() {
        let records = [
            publication("", "", "", ""),
            publication("x", "y", "z", "w"),
            publication("Space station crew health", "space", "bone, muscle", "long impact"),
        ];
        for r in &records {
            for q in ["", "a", "space", "nothing matches here"] {
                assert!(score(r, &words(q), q) >= 0);
            }
        }
    }

    #[test]
    fn test_tags_list_is_scored() {
        let mut p = publication("An unrelated but sufficiently long title", "", "", "");
        p.tags = Tags::List(vec!["tendon".into(), "rats".into()]);
        assert_eq!(score(&p, &words("rats"), "rats"), 100 + 15);
    }
}
