/// Title deduplication and ranked merging of local and external results.

use crate::record::Publication;

/// Overlap ratio above which two titles are treated as the same publication.
const DUPLICATE_OVERLAP: f64 = 0.95;

/// Leniency pass: fewer survivors than this triggers it...
const LENIENT_MIN_SURVIVORS: usize = 2;
/// ...when more external records than this were supplied...
const LENIENT_MIN_ORIGINAL: usize = 2;
/// ...and re-admits at most this many.
const LENIENT_READMIT: usize = 3;

/// Score assumed for an external record that reports no relevance.
const EXTERNAL_DEFAULT_SCORE: i64 = 80;

pub const EXTERNAL_CATEGORY: &str = "External NASA";

/// Lowercase, drop everything but ASCII word characters and whitespace, trim.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn title_tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// True when two titles name the same publication.
///
/// Exact match after normalization, or token overlap relative to the shorter
/// title above 0.95 (tokens of two characters or fewer are ignored).
pub fn similar_titles(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let norm_a = normalize_title(a);
    let norm_b = normalize_title(b);
    if norm_a == norm_b {
        return true;
    }

    let words_a = title_tokens(&norm_a);
    let words_b = title_tokens(&norm_b);
    let shorter = words_a.len().min(words_b.len());
    if shorter == 0 {
        return false;
    }
    let common = words_a.iter().filter(|w| words_b.contains(w)).count();
    common as f64 / shorter as f64 > DUPLICATE_OVERLAP
}

/// Keep the first record of each group of similar titles.
pub fn dedup_by_title(records: Vec<Publication>) -> Vec<Publication> {
    let mut kept: Vec<Publication> = Vec::with_capacity(records.len());
    for record in records {
        if !kept.iter().any(|k| similar_titles(&k.title, &record.title)) {
            kept.push(record);
        }
    }
    kept
}

/// Base score of an external record before the merge boost.
fn external_base_score(record: &Publication) -> i64 {
    if record.relevance_score > 0 {
        return record.relevance_score;
    }
    match record.relevance.map(|r| (r * 100.0).round() as i64) {
        Some(score) if score != 0 => score,
        _ => EXTERNAL_DEFAULT_SCORE,
    }
}

fn as_external(record: &Publication) -> Publication {
    Publication {
        category: EXTERNAL_CATEGORY.to_string(),
        ..record.clone()
    }
}

/// Merge settings.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Added to every surviving external record's score
    pub external_boost: i64,
    /// Length of the merged list
    pub max_results: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions { external_boost: 10, max_results: 40 }
    }
}

/// External records that are not duplicates of a local record.
///
/// Returns the survivors of the similarity pass and the number re-admitted
/// by the lenient exact-title pass.
pub fn dedup_external(local: &[Publication], external: &[Publication]) -> (Vec<Publication>, usize) {
    let mut unique: Vec<Publication> = external
        .iter()
        .filter(|ext| !local.iter().any(|l| similar_titles(&l.title, &ext.title)))
        .map(as_external)
        .collect();

    let survivors = unique.len();
    let mut readmitted = 0;
    if survivors < LENIENT_MIN_SURVIVORS && external.len() > LENIENT_MIN_ORIGINAL {
        let extra: Vec<Publication> = external
            .iter()
            .filter(|ext| !unique.iter().any(|u| u.title == ext.title))
            .take(LENIENT_READMIT)
            .map(as_external)
            .collect();
        readmitted = extra.len();
        unique.extend(extra);
    }

    tracing::debug!(
        external = external.len(),
        survivors,
        readmitted,
        "Deduplicated external results"
    );

    (unique, readmitted)
}

/// Combine scored local results with normalized external results.
///
/// External records come first and carry a score boost; the combined list is
/// sorted by adjusted score (stable) and truncated. An empty external set
/// returns `local` untouched.
pub fn combine_results(
    local: Vec<Publication>,
    external: &[Publication],
    options: MergeOptions,
) -> Vec<Publication> {
    if external.is_empty() {
        return local;
    }

    let (unique, _) = dedup_external(&local, external);

    let mut combined: Vec<Publication> = unique
        .into_iter()
        .map(|mut r| {
            r.adjusted_score = external_base_score(&r) + options.external_boost;
            r
        })
        .chain(local.into_iter().map(|mut r| {
            r.adjusted_score = r.relevance_score;
            r
        }))
        .collect();

    combined.sort_by(|a, b| b.adjusted_score.cmp(&a.adjusted_score));
    combined.truncate(options.max_results);
    combined
}
