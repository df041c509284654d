/// Local publication collection
///
/// Sources return every record of the catalog adapted to `Publication`.
/// The search pipeline reads the whole collection and scores it in memory.

pub mod file;
pub mod firestore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::CollectionConfig;
use crate::errors::BioseekerError;
use crate::record::Publication;

pub use file::FileSource;
pub use firestore::FirestoreSource;

/// Errors that can occur while reading the collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure
    #[error("Request error: {0}")]
    Request(String),

    /// Remote store returned an HTTP error
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Documents could not be decoded
    #[error("Malformed collection data: {0}")]
    Malformed(String),

    /// Source not configured (e.g., missing project id)
    #[error("Collection not configured: {0}")]
    NotConfigured(String),
}

/// A read-only source of publication records.
///
/// Implementations must be Send + Sync so a single source can be shared
/// between the interactive loop and spawned searches.
#[async_trait]
pub trait PublicationSource: Send + Sync {
    /// Fetch every record in the collection.
    async fn fetch_all(&self) -> Result<Vec<Publication>, CollectionError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Create the collection source based on configuration.
pub fn create_source(config: &CollectionConfig) -> Result<Arc<dyn PublicationSource>, CollectionError> {
    match config.provider.as_str() {
        "firestore" => Ok(Arc::new(FirestoreSource::from_config(config)?)),
        "file" => Ok(Arc::new(FileSource::new(&config.file_path))),
        other => Err(CollectionError::NotConfigured(format!(
            "unknown collection provider '{}', expected 'file' or 'firestore'",
            other
        ))),
    }
}

/// Build the configured source and read the whole collection.
///
/// # Errors
/// Any source failure becomes `BioseekerError::Collection`: without the
/// collection there is nothing to search.
pub async fn load_collection(config: &CollectionConfig) -> Result<Vec<Publication>, BioseekerError> {
    let source = create_source(config)?;
    let publications = source.fetch_all().await?;
    tracing::info!(source = source.name(), count = publications.len(), "Collection loaded");
    Ok(publications)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_source_by_provider() {
        let mut config = CollectionConfig::default();
        assert_eq!(create_source(&config).unwrap().name(), "file");

        config.provider = "firestore".into();
        assert!(matches!(create_source(&config), Err(CollectionError::NotConfigured(_))));

        config.firestore_project_id = Some("bioseeker-demo".into());
        assert_eq!(create_source(&config).unwrap().name(), "firestore");

        config.provider = "mongo".into();
        assert!(create_source(&config).is_err());
    }

    #[tokio::test]
    async fn test_load_collection_reports_collection_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectionConfig {
            file_path: dir.path().join("absent.json").to_string_lossy().into_owned(),
            ..Default::default()
        };
        let err = load_collection(&config).await.unwrap_err();
        assert!(matches!(err, BioseekerError::Collection(_)));
    }
}
