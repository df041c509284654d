/// Term-weighted search driven by AI-extracted query terms.
///
/// Unlike the catalog scorer this one counts every term from the enhanced
/// query independently and records which fields matched, so results can be
/// explained and bucketed into relevance tiers.

use serde::Serialize;

use crate::ai::research::EnhancedQuery;
use crate::record::Publication;

const EXACT_TITLE: i64 = 100;
const TERM_TITLE: i64 = 50;
const TERM_CATEGORY: i64 = 30;
const TERM_TAGS: i64 = 25;
const MULTI_FIELD_PER_FIELD: i64 = 10;

/// Which terms matched which field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchDetails {
    pub title_matches: Vec<String>,
    pub category_matches: Vec<String>,
    pub tag_matches: Vec<String>,
    pub exact_match: bool,
}

impl MatchDetails {
    fn matched_fields(&self) -> usize {
        [
            !self.title_matches.is_empty(),
            !self.category_matches.is_empty(),
            !self.tag_matches.is_empty(),
        ]
        .iter()
        .filter(|m| **m)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelevanceTier {
    HighlyRelevant,
    VeryRelevant,
    Relevant,
    SomewhatRelevant,
    SlightlyRelevant,
}

impl RelevanceTier {
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s >= 100 => RelevanceTier::HighlyRelevant,
            s if s >= 75 => RelevanceTier::VeryRelevant,
            s if s >= 50 => RelevanceTier::Relevant,
            s if s >= 25 => RelevanceTier::SomewhatRelevant,
            _ => RelevanceTier::SlightlyRelevant,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelevanceTier::HighlyRelevant => "Highly Relevant",
            RelevanceTier::VeryRelevant => "Very Relevant",
            RelevanceTier::Relevant => "Relevant",
            RelevanceTier::SomewhatRelevant => "Somewhat Relevant",
            RelevanceTier::SlightlyRelevant => "Slightly Relevant",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancedHit {
    pub publication: Publication,
    pub score: i64,
    pub details: MatchDetails,
    pub tier: RelevanceTier,
}

/// Original term followed by every extracted term longer than one character.
pub fn search_terms(enhanced: &EnhancedQuery, original: &str) -> Vec<String> {
    std::iter::once(original.to_string())
        .chain(enhanced.keywords.iter().cloned())
        .chain(enhanced.scientific_terms.iter().cloned())
        .chain(enhanced.categories.iter().cloned())
        .chain(enhanced.tags.iter().cloned())
        .filter(|t| t.chars().count() > 1)
        .collect()
}

pub fn score_enhanced(publication: &Publication, terms: &[String], original: &str) -> (i64, MatchDetails) {
    let title = publication.title.to_lowercase();
    let category = publication.category.to_lowercase();
    let tags = publication.tags.join_with(" ").to_lowercase();

    let mut score = 0;
    let mut details = MatchDetails::default();

    if title.contains(&original.to_lowercase()) {
        score += EXACT_TITLE;
        details.exact_match = true;
    }

    for term in terms {
        let lower = term.to_lowercase();
        if title.contains(&lower) {
            score += TERM_TITLE;
            details.title_matches.push(term.clone());
        }
        if category.contains(&lower) {
            score += TERM_CATEGORY;
            details.category_matches.push(term.clone());
        }
        if tags.contains(&lower) {
            score += TERM_TAGS;
            details.tag_matches.push(term.clone());
        }
    }

    let fields = details.matched_fields();
    if fields > 1 {
        score += fields as i64 * MULTI_FIELD_PER_FIELD;
    }

    (score, details)
}

/// Score every record, keep positive scores, best first.
pub fn search_enhanced(
    publications: &[Publication],
    enhanced: &EnhancedQuery,
    original: &str,
) -> Vec<EnhancedHit> {
    let terms = search_terms(enhanced, original);

    let mut hits: Vec<EnhancedHit> = publications
        .iter()
        .filter_map(|p| {
            let (score, details) = score_enhanced(p, &terms, original);
            (score > 0).then(|| EnhancedHit {
                publication: Publication {
                    relevance_score: score,
                    ..p.clone()
                },
                score,
                details,
                tier: RelevanceTier::from_score(score),
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
