/// Local catalog search: expand, score, threshold, sort.

use crate::record::{Publication, Tags};

use super::expand::{expand_query, query_words};
use super::scoring::score;

/// Collections smaller than this get a relaxed threshold.
const SPARSE_COLLECTION: usize = 10;

const DESCRIPTION_MAX_CHARS: usize = 200;

/// Minimum score a record needs for a query with `word_count` words,
/// searched against a collection of `collection_len` records.
///
/// Single-word queries need a strong match; longer queries get progressively
/// lower bars. Sparse collections halve the bar (floored at 5).
pub fn min_score(word_count: usize, collection_len: usize) -> f64 {
    let base = match word_count {
        1 => 40.0,
        2 => 25.0,
        _ => 15.0,
    };
    if collection_len < SPARSE_COLLECTION {
        f64::max(5.0, base * 0.5)
    } else {
        base
    }
}

/// Score `publications` against `query`, keep those at or above the
/// threshold and sort by descending score.
///
/// Equal scores keep their collection order.
pub fn search_publications(publications: &[Publication], query: &str) -> Vec<Publication> {
    if query.is_empty() || publications.is_empty() {
        return Vec::new();
    }

    let expanded = expand_query(query).to_lowercase();
    let words = query_words(&expanded);
    let threshold = min_score(words.len(), publications.len());

    let mut results: Vec<Publication> = publications
        .iter()
        .filter_map(|p| {
            let relevance_score = score(p, &words, &expanded);
            (relevance_score as f64 >= threshold).then(|| Publication {
                relevance_score,
                ..p.clone()
            })
        })
        .collect();

    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

    tracing::debug!(
        query = %query,
        words = words.len(),
        threshold,
        matched = results.len(),
        total = publications.len(),
        "Local search complete"
    );

    results
}

/// Display description: impact, else the category, else a generic label.
pub fn describe(publication: &Publication) -> String {
    let impact = publication.impact.trim();
    let category = publication.category.trim();
    let description = if !impact.is_empty() {
        impact.to_string()
    } else if !category.is_empty() {
        format!("Category: {}", category)
    } else {
        "Space biology research publication".to_string()
    };
    truncate_chars(&description, DESCRIPTION_MAX_CHARS)
}

/// Truncate to `max` characters, ending with "..." when shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Fill display defaults for the top `max_results` local hits.
pub fn format_results(results: &[Publication], max_results: usize) -> Vec<Publication> {
    results
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(index, p)| {
            let mut formatted = p.clone();
            formatted.description = describe(p);
            if formatted.id.is_none() {
                formatted.id = Some(format!("local-{}", index));
            }
            if formatted.title.trim().is_empty() {
                formatted.title = "Untitled Research".to_string();
            }
            if formatted.link.is_none() {
                formatted.link = Some("#".to_string());
            }
            if formatted.category.trim().is_empty() {
                formatted.category = "Space Biology".to_string();
            }
            if formatted.tags.is_empty() {
                formatted.tags = Tags::from("research, space biology");
            }
            formatted
        })
        .collect()
}
