pub mod cache;
pub mod cancel;
pub mod debounce;
pub mod enhanced;
pub mod expand;
pub mod external;
pub mod local;
pub mod merge;
pub mod scoring;
pub mod service;

// Re-export key types for convenience
pub use cache::{CachedSearch, SearchCache, SearchStats};
pub use cancel::{CallGuard, CancellationRegistry};
pub use enhanced::{EnhancedHit, MatchDetails, RelevanceTier};
pub use merge::MergeOptions;
pub use service::{is_question, SearchEvent, SearchOutcome, SearchService};
