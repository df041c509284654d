/// Research operations built on the AI collaborator
///
/// Every operation degrades instead of failing: without a provider, or when a
/// call errors, times out or is cancelled, the caller gets an empty/fallback
/// value and a warning is logged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::perplexity::PerplexityProvider;
use super::text::clean_response;
use super::{
    build_analysis_prompt, build_enhancement_prompt, build_external_search_prompt,
    build_gap_prompt, build_summary_prompt, AiError, AiProvider, CompletionRequest,
};
use crate::config::AiConfig;
use crate::record::Publication;
use crate::search::expand::{expand_query, query_words};
use crate::search::external::normalize;

/// Number of merged results given to the model as summary context.
const SUMMARY_CONTEXT_RESULTS: usize = 10;

const EXTERNAL_SEARCH_MAX_TOKENS: u32 = 1500;
const SUMMARY_MAX_TOKENS: u32 = 500;
const ANALYSIS_MAX_TOKENS: u32 = 1000;

/// Overview (topic searches) or answer (questions) generated for a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSummary {
    pub summary: String,
    pub is_question: bool,
}

/// Search terms extracted from a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedQuery {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, rename = "scientificTerms", alias = "scientific_terms")]
    pub scientific_terms: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// False when the terms came from the local expansion table
    #[serde(default)]
    pub ai_generated: bool,
}

impl EnhancedQuery {
    /// Terms derived without the AI collaborator: words of the expanded query.
    pub fn fallback(query: &str) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        for word in query_words(&expand_query(query)) {
            if !keywords.contains(&word) {
                keywords.push(word);
            }
        }
        EnhancedQuery {
            keywords,
            ..Default::default()
        }
    }
}

/// Structured analysis of a single publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub gaps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub topic: String,
    pub analysis: String,
    pub citations: Vec<String>,
}

/// Slice from the first `{` to the last `}`, if any.
fn embedded_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Front door to the AI collaborator for the search pipeline and CLI.
#[derive(Clone)]
pub struct ResearchAssistant {
    provider: Option<Arc<dyn AiProvider>>,
    allowed_domains: Vec<String>,
    max_external_results: usize,
}

impl ResearchAssistant {
    pub fn new(provider: Option<Arc<dyn AiProvider>>, config: &AiConfig) -> Self {
        ResearchAssistant {
            provider,
            allowed_domains: config.allowed_domains.clone(),
            max_external_results: config.max_external_results,
        }
    }

    /// Build the assistant from configuration; no credential means local-only.
    pub fn from_config(config: &AiConfig) -> Self {
        if !config.is_enabled() {
            tracing::warn!("No AI API key configured, AI features disabled (local-only search)");
            return Self::new(None, config);
        }
        match PerplexityProvider::from_config(config) {
            Ok(provider) => {
                tracing::info!(model = provider.model_name(), "AI collaborator enabled");
                Self::new(Some(Arc::new(provider)), config)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to init AI provider, AI features disabled");
                Self::new(None, config)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn AiProvider>, AiError> {
        self.provider
            .as_ref()
            .ok_or_else(|| AiError::NotConfigured("no AI API key".to_string()))
    }

    /// Search the allow-listed NASA sites. Empty on any failure.
    pub async fn search_external(&self, query: &str, cancel: &CancellationToken) -> Vec<Publication> {
        match self.try_search_external(query, cancel).await {
            Ok(records) => records,
            Err(AiError::Cancelled) => {
                tracing::debug!(query = %query, "External search superseded");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "External search failed, using local results only");
                Vec::new()
            }
        }
    }

    async fn try_search_external(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Publication>, AiError> {
        let provider = self.provider()?;
        let (system, user) =
            build_external_search_prompt(query, &self.allowed_domains, self.max_external_results);
        let request = CompletionRequest::new(system, user)
            .max_tokens(EXTERNAL_SEARCH_MAX_TOKENS)
            .with_citations(&self.allowed_domains);

        let completion = provider.complete(request, cancel).await?;
        Ok(normalize(&completion, &self.allowed_domains, self.max_external_results))
    }

    /// Overview or answer for the top results. `None` when unavailable.
    pub async fn summarize(
        &self,
        results: &[Publication],
        query: &str,
        is_question: bool,
        cancel: &CancellationToken,
    ) -> Option<AiSummary> {
        if results.is_empty() {
            return None;
        }
        let provider = self.provider.as_ref()?;

        let context = results
            .iter()
            .take(SUMMARY_CONTEXT_RESULTS)
            .map(|r| format!("{}: {}", r.title, r.impact))
            .collect::<Vec<_>>()
            .join("\n\n");
        let (system, user) = build_summary_prompt(query, &context, is_question);
        let request = CompletionRequest::new(system, user).max_tokens(SUMMARY_MAX_TOKENS);

        match provider.complete(request, cancel).await {
            Ok(completion) => {
                let summary = clean_response(&completion.content);
                (!summary.is_empty()).then_some(AiSummary { summary, is_question })
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI summary unavailable");
                None
            }
        }
    }

    /// Extract search terms; falls back to the expansion table.
    pub async fn enhance_query(&self, query: &str, cancel: &CancellationToken) -> EnhancedQuery {
        match self.try_enhance_query(query, cancel).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                tracing::warn!(error = %e, "Query enhancement unavailable, using fallback expansion");
                EnhancedQuery::fallback(query)
            }
        }
    }

    async fn try_enhance_query(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<EnhancedQuery, AiError> {
        let provider = self.provider()?;
        let request = CompletionRequest::new(
            "You extract search terms for a space biology publication catalog.",
            build_enhancement_prompt(query),
        );
        let completion = provider.complete(request, cancel).await?;

        let json = embedded_object(&completion.content)
            .ok_or_else(|| AiError::Malformed("no JSON object in enhancement output".to_string()))?;
        let mut enhanced: EnhancedQuery = serde_json::from_str(json)
            .map_err(|e| AiError::Malformed(format!("Failed to parse enhancement JSON: {}", e)))?;
        enhanced.ai_generated = true;
        Ok(enhanced)
    }

    /// Summary, key findings and open gaps for one publication.
    pub async fn analyze_publication(
        &self,
        publication: &Publication,
        cancel: &CancellationToken,
    ) -> Option<PublicationAnalysis> {
        let provider = self.provider.as_ref()?;
        let prompt = build_analysis_prompt(
            &publication.title,
            publication.link.as_deref().unwrap_or("unknown"),
            &publication.impact,
        );
        let request = CompletionRequest::new(
            "You are a NASA space biology research analyst.",
            prompt,
        )
        .max_tokens(ANALYSIS_MAX_TOKENS);

        let completion = match provider.complete(request, cancel).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, title = %publication.title, "Publication analysis failed");
                return None;
            }
        };

        let parsed = embedded_object(&completion.content)
            .and_then(|json| serde_json::from_str::<PublicationAnalysis>(json).ok());
        let analysis = match parsed {
            Some(a) => PublicationAnalysis {
                summary: clean_response(&a.summary),
                findings: clean_response(&a.findings),
                gaps: clean_response(&a.gaps),
            },
            None => PublicationAnalysis {
                summary: clean_response(&completion.content),
                ..Default::default()
            },
        };
        Some(analysis)
    }

    /// Research-gap analysis for a topic, with supporting citations.
    pub async fn analyze_research_gaps(
        &self,
        topic: &str,
        cancel: &CancellationToken,
    ) -> Option<GapAnalysis> {
        let provider = self.provider.as_ref()?;
        let request = CompletionRequest::new(
            "You are a NASA space biology research analyst.",
            build_gap_prompt(topic),
        )
        .max_tokens(ANALYSIS_MAX_TOKENS)
        .with_citations(&self.allowed_domains);

        match provider.complete(request, cancel).await {
            Ok(completion) => Some(GapAnalysis {
                topic: topic.to_string(),
                analysis: clean_response(&completion.content),
                citations: completion.citations,
            }),
            Err(e) => {
                tracing::warn!(error = %e, topic = %topic, "Research gap analysis failed");
                None
            }
        }
    }
}
