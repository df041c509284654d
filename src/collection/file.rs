/// JSON file collection: a single array of publication documents.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{CollectionError, PublicationSource};
use crate::record::{Publication, RawPublication};

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PublicationSource for FileSource {
    async fn fetch_all(&self) -> Result<Vec<Publication>, CollectionError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let raw: Vec<RawPublication> = serde_json::from_slice(&bytes).map_err(|e| {
            CollectionError::Malformed(format!("{}: {}", self.path.display(), e))
        })?;

        let publications: Vec<Publication> = raw
            .into_iter()
            .enumerate()
            .map(|(index, doc)| {
                let mut publication = Publication::from_raw(doc);
                if publication.id.is_none() {
                    publication.id = Some(format!("doc-{}", index));
                }
                publication
            })
            .collect();

        tracing::debug!(path = %self.path.display(), count = publications.len(), "Loaded collection file");
        Ok(publications)
    }

    fn name(&self) -> &str {
        "file"
    }
}
