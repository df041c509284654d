/// AI collaborator provider trait and supporting types
///
/// Provides a pluggable interface over a hosted chat/completion endpoint that
/// can search the web and return citations (Perplexity-compatible).
/// Every call is cancellable and bounded by a timeout; callers treat any
/// error as "no AI contribution".

pub mod perplexity;
pub mod research;
pub mod text;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while calling the AI collaborator.
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport failure or unreadable body
    #[error("AI request failed: {0}")]
    Request(String),

    /// API provider returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Malformed AI response: {0}")]
    Malformed(String),

    /// Provider not configured (missing API key)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Call exceeded its hard timeout
    #[error("AI request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Call was superseded by a newer query
    #[error("AI request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: "user".to_string(), content: content.into() }
    }
}

/// One completion request. The provider supplies the model identifier.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub return_citations: bool,
    /// Restrict web search to these domains (empty = unrestricted)
    pub domain_filter: Vec<String>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: 500,
            temperature: 0.3,
            return_citations: false,
            domain_filter: Vec::new(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_citations(mut self, domains: &[String]) -> Self {
        self.return_citations = true;
        self.domain_filter = domains.to_vec();
        self
    }
}

/// Generated text plus any citation URLs the endpoint attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub citations: Vec<String>,
}

/// Core trait for the AI collaborator.
///
/// Implementations must be Send + Sync (shared as Arc<dyn AiProvider>).
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Run one completion. Returns `AiError::Cancelled` as soon as `cancel`
    /// fires and `AiError::Timeout` when the provider's deadline passes.
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, AiError>;

    /// Return the model name identifier used by this provider.
    fn model_name(&self) -> &str;
}

/// Build the external NASA search prompt pair.
pub fn build_external_search_prompt(query: &str, domains: &[String], max_results: usize) -> (String, String) {
    let system = format!(
        "Search NASA websites and return relevant results with titles and URLs. \
         Focus on {}. \
         When possible, answer with a JSON array of objects with \"title\", \"url\" \
         and \"description\" fields.",
        domains.join(", ")
    );
    let user = format!(
        "Search NASA websites for: \"{query}\". \
         Return up to {max_results} results with titles, URLs, and brief descriptions."
    );
    (system, user)
}

/// Build the query enhancement prompt.
pub fn build_enhancement_prompt(query: &str) -> String {
    format!(
        "Analyze this space biology search query and extract search terms.\n\
         Output only valid JSON of the form \
         {{\"keywords\": [], \"scientificTerms\": [], \"categories\": [], \"tags\": []}}. \
         Do not add commentary.\n\n\
         Query: {query}"
    )
}

/// Build the summary prompt from `title: impact` context lines.
pub fn build_summary_prompt(query: &str, context: &str, is_question: bool) -> (String, String) {
    let system = if is_question {
        "Answer the question using the space biology research results provided. \
         Be concise and factual."
    } else {
        "Summarize space biology research findings concisely."
    };
    (system.to_string(), format!("Query: \"{query}\"\n\nResults:\n{context}"))
}

/// Build the single-publication analysis prompt.
pub fn build_analysis_prompt(title: &str, link: &str, impact: &str) -> String {
    format!(
        "Analyze this NASA space biology publication.\n\
         Title: {title}\n\
         Link: {link}\n\
         Known impact: {impact}\n\n\
         Output only valid JSON of the form \
         {{\"summary\": \"...\", \"findings\": \"...\", \"gaps\": \"...\"}} \
         where findings are the key results and gaps the open research questions."
    )
}

/// Build the research gap analysis prompt.
pub fn build_gap_prompt(topic: &str) -> String {
    format!(
        "Identify the main research gaps in NASA space biology research on: \"{topic}\". \
         List what has been studied, what remains unknown, and which experiments \
         would close the gaps."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let domains = vec!["science.nasa.gov".to_string()];
        let request = CompletionRequest::new("sys", "user")
            .max_tokens(1500)
            .with_citations(&domains);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "user");
        assert_eq!(request.max_tokens, 1500);
        assert!(request.return_citations);
        assert_eq!(request.domain_filter, domains);
    }

    #[test]
    fn test_external_search_prompt_mentions_domains_and_limit() {
        let domains = vec!["science.nasa.gov".to_string(), "taskbook.nasaprs.com".to_string()];
        let (system, user) = build_external_search_prompt("bone loss", &domains, 7);
        assert!(system.contains("science.nasa.gov, taskbook.nasaprs.com"));
        assert!(user.contains("\"bone loss\""));
        assert!(user.contains("up to 7 results"));
    }

    #[test]
    fn test_summary_prompt_switches_on_question() {
        let (q_system, _) = build_summary_prompt("why?", "a: b", true);
        let (t_system, user) = build_summary_prompt("bone", "a: b", false);
        assert!(q_system.starts_with("Answer"));
        assert!(t_system.starts_with("Summarize"));
        assert!(user.ends_with("Results:\na: b"));
    }
}
