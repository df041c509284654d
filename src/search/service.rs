/// Search session: cache, local search, external search, merge, summary.
///
/// Local results are published on the event channel as soon as they are
/// computed; the merged list follows once the external call resolves, fails,
/// times out or is superseded by a newer search.

use regex::Regex;
use serde::Serialize;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;

use super::cache::{CachedSearch, SearchCache, SearchStats};
use super::cancel::CancellationRegistry;
use super::enhanced::{search_enhanced, EnhancedHit};
use super::local::{format_results, search_publications};
use super::merge::{combine_results, MergeOptions};
use crate::ai::research::{AiSummary, EnhancedQuery, ResearchAssistant};
use crate::config::SearchConfig;
use crate::errors::BioseekerError;
use crate::record::Publication;

static LEADING_QUESTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(what|why|how|when|where|who|which|can|does|do|is|are|will|would|could|should)\b")
        .expect("valid regex")
});
static QUESTION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(what|why|how|when|where|who|which)\b").expect("valid regex"));

/// True for questions ("how does ...", "... ?") as opposed to topic searches.
pub fn is_question(query: &str) -> bool {
    let q = query.trim().to_lowercase();
    LEADING_QUESTION_WORD.is_match(&q) || q.ends_with('?') || QUESTION_WORD.is_match(&q)
}

/// Progress of one search.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// Formatted local hits, available before the external call resolves
    Local(Vec<Publication>),
    /// Final merged outcome, supersedes `Local`
    Merged(SearchOutcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<Publication>,
    pub ai_summary: Option<AiSummary>,
    pub stats: SearchStats,
    /// A newer search cancelled this one before it finished
    pub superseded: bool,
}

pub struct SearchService {
    assistant: ResearchAssistant,
    cache: Mutex<SearchCache>,
    registry: CancellationRegistry,
    merge: MergeOptions,
    format_limit: usize,
    summarize: bool,
}

impl SearchService {
    pub fn new(assistant: ResearchAssistant, config: &SearchConfig) -> Self {
        SearchService {
            assistant,
            cache: Mutex::new(SearchCache::new(config.cache_ttl(), config.cache_capacity)),
            registry: CancellationRegistry::new(),
            merge: MergeOptions {
                external_boost: config.external_boost,
                max_results: config.max_results,
            },
            format_limit: config.format_limit,
            summarize: config.summarize,
        }
    }

    pub fn assistant(&self) -> &ResearchAssistant {
        &self.assistant
    }

    pub fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    /// Abort every in-flight external call.
    pub fn cancel_ongoing(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, query: &str) -> Option<CachedSearch> {
        self.cache.lock().ok()?.get(query)
    }

    fn store(&self, query: &str, data: CachedSearch) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.set(query, data);
        }
    }

    /// Run the full pipeline for `query` against the local `publications`.
    ///
    /// # Errors
    /// Only an empty query is rejected; collaborator failures degrade.
    pub async fn search(
        &self,
        query: &str,
        publications: &[Publication],
        events: Option<&mpsc::Sender<SearchEvent>>,
    ) -> Result<SearchOutcome, BioseekerError> {
        if query.trim().is_empty() {
            return Err(BioseekerError::validation("query", "Please enter a search query"));
        }

        let started = Instant::now();
        let is_question = is_question(query);

        // A newer query supersedes older ones even when served from cache
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "Superseded in-flight external calls");
        }

        if let Some(cached) = self.cached(query) {
            tracing::debug!(query = %query, "Using cached results");
            let outcome = SearchOutcome {
                query: query.to_string(),
                results: cached.results,
                ai_summary: cached.ai_summary,
                stats: SearchStats { cached: true, ..cached.stats },
                superseded: false,
            };
            emit(events, SearchEvent::Merged(outcome.clone())).await;
            return Ok(outcome);
        }

        let call = self.registry.issue();

        let local = format_results(&search_publications(publications, query), self.format_limit);
        let local_count = local.len();
        emit(events, SearchEvent::Local(local.clone())).await;

        let external = self.assistant.search_external(query, call.token()).await;
        let has_external = !external.is_empty();

        let mut results = combine_results(local, &external, self.merge);
        for (index, result) in results.iter_mut().enumerate() {
            result.id = Some(format!("result-{}", index));
        }

        let ai_summary = if self.summarize && !call.token().is_cancelled() {
            self.assistant
                .summarize(&results, query, is_question, call.token())
                .await
        } else {
            None
        };

        let superseded = call.token().is_cancelled();
        let stats = SearchStats {
            result_count: results.len(),
            local_count,
            external_count: external.len(),
            search_time_ms: started.elapsed().as_millis() as u64,
            has_ai: ai_summary.is_some(),
            has_external,
            cached: false,
        };

        tracing::info!(
            query = %query,
            results = stats.result_count,
            local = stats.local_count,
            external = stats.external_count,
            has_ai = stats.has_ai,
            elapsed_ms = stats.search_time_ms,
            superseded,
            "Search complete"
        );

        if !superseded {
            self.store(
                query,
                CachedSearch {
                    results: results.clone(),
                    ai_summary: ai_summary.clone(),
                    stats: stats.clone(),
                },
            );
        }

        let outcome = SearchOutcome {
            query: query.to_string(),
            results,
            ai_summary,
            stats,
            superseded,
        };
        emit(events, SearchEvent::Merged(outcome.clone())).await;
        Ok(outcome)
    }

    /// Term-weighted search using AI-extracted terms (or the fallback expansion).
    pub async fn search_enhanced(
        &self,
        query: &str,
        publications: &[Publication],
    ) -> Result<(EnhancedQuery, Vec<EnhancedHit>), BioseekerError> {
        if query.trim().is_empty() {
            return Err(BioseekerError::validation("query", "Please enter a search query"));
        }
        let call = self.registry.issue();
        let enhanced = self.assistant.enhance_query(query, call.token()).await;
        let hits = search_enhanced(publications, &enhanced, query);
        tracing::info!(
            query = %query,
            ai_generated = enhanced.ai_generated,
            hits = hits.len(),
            "Enhanced search complete"
        );
        Ok((enhanced, hits))
    }
}

async fn emit(events: Option<&mpsc::Sender<SearchEvent>>, event: SearchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
