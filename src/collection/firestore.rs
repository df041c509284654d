/// Firestore collection read through the public REST API
///
/// Lists documents page by page (`pageSize` / `nextPageToken`) and decodes
/// Firestore's typed values (`stringValue`, `arrayValue`, ...) into plain JSON
/// before adapting each document to a `Publication`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CollectionError, PublicationSource};
use crate::config::CollectionConfig;
use crate::record::{Publication, RawPublication};

/// One page of `documents.list`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

pub struct FirestoreSource {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    collection: String,
    page_size: u32,
}

impl FirestoreSource {
    /// # Errors
    /// Returns `CollectionError::NotConfigured` if the project id is missing.
    pub fn from_config(config: &CollectionConfig) -> Result<Self, CollectionError> {
        let project_id = config
            .firestore_project_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                CollectionError::NotConfigured(
                    "Firestore project id is required when collection provider is 'firestore'. \
                     Set BIOSEEKER_COLLECTION__FIRESTORE_PROJECT_ID or collection.firestore_project_id in bioseeker.toml"
                        .to_string(),
                )
            })?;

        Ok(FirestoreSource {
            client: reqwest::Client::new(),
            base_url: config.firestore_base_url.trim_end_matches('/').to_string(),
            project_id,
            api_key: config.firestore_api_key.clone(),
            collection: config.collection.clone(),
            page_size: config.page_size.max(1),
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, self.collection
        )
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListResponse, CollectionError> {
        let mut query: Vec<(&str, String)> = vec![("pageSize", self.page_size.to_string())];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(self.documents_url())
            .query(&query)
            .send()
            .await
            .map_err(|e| CollectionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CollectionError::Api { status, message });
        }

        response
            .json::<ListResponse>()
            .await
            .map_err(|e| CollectionError::Malformed(format!("Failed to parse Firestore response: {}", e)))
    }
}

/// Decode one Firestore typed value into plain JSON.
pub fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" | "doubleValue" => inner.clone(),
        // int64 is transported as a decimal string
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(
            inner.get("fields").and_then(Value::as_object).unwrap_or(&Map::new()),
        )),
        _ => Value::Null,
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Adapt a Firestore document; the id is the last segment of its resource name.
fn to_publication(document: Document) -> Result<Publication, CollectionError> {
    let mut fields = decode_fields(&document.fields);
    fields.retain(|_, v| !v.is_null());
    if let Some(id) = document.name.rsplit('/').next().filter(|s| !s.is_empty()) {
        fields.insert("id".to_string(), Value::from(id));
    }

    let raw: RawPublication = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        CollectionError::Malformed(format!("document {}: {}", document.name, e))
    })?;
    Ok(Publication::from_raw(raw))
}

#[async_trait]
impl PublicationSource for FirestoreSource {
    async fn fetch_all(&self) -> Result<Vec<Publication>, CollectionError> {
        let mut publications = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;
            for document in page.documents {
                match to_publication(document) {
                    Ok(p) => publications.push(p),
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable document"),
                }
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            project = %self.project_id,
            collection = %self.collection,
            pages,
            count = publications.len(),
            "Loaded Firestore collection"
        );
        Ok(publications)
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Tags;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS_PATH: &str = "/projects/demo/databases/(default)/documents/publications";

    fn source(base_url: &str) -> FirestoreSource {
        FirestoreSource::from_config(&CollectionConfig {
            provider: "firestore".into(),
            firestore_base_url: base_url.into(),
            firestore_project_id: Some("demo".into()),
            firestore_api_key: Some("web-key".into()),
            page_size: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_decode_typed_values() {
        let value = json!({"mapValue": {"fields": {
            "Title": {"stringValue": "Bone loss"},
            "Tags": {"arrayValue": {"values": [{"stringValue": "bone"}, {"stringValue": "rodent"}]}},
            "Year": {"integerValue": "2021"},
            "Open": {"booleanValue": true},
            "Empty": {"arrayValue": {}}
        }}});
        assert_eq!(
            decode_value(&value),
            json!({"Title": "Bone loss", "Tags": ["bone", "rodent"], "Year": 2021, "Open": true, "Empty": []})
        );
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
    }

    #[tokio::test]
    async fn test_fetch_all_follows_page_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .and(query_param("pageToken", "next-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{
                    "name": "projects/demo/databases/(default)/documents/publications/c3",
                    "fields": {"title": {"stringValue": "Plant roots"}, "tags": {"stringValue": "plant"}}
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DOCS_PATH))
            .and(query_param("key", "web-key"))
            .and(query_param("pageSize", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    {
                        "name": "projects/demo/databases/(default)/documents/publications/a1",
                        "fields": {
                            "Title": {"stringValue": "Bone loss in mice"},
                            "Tags": {"arrayValue": {"values": [{"stringValue": "bone"}]}},
                            "Impact": {"stringValue": "Rapid loss."}
                        }
                    },
                    {"name": "projects/demo/databases/(default)/documents/publications/b2"}
                ],
                "nextPageToken": "next-1"
            })))
            .mount(&server)
            .await;

        let records = source(&server.uri()).fetch_all().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_deref(), Some("a1"));
        assert_eq!(records[0].title, "Bone loss in mice");
        assert_eq!(records[0].tags, Tags::List(vec!["bone".into()]));
        assert_eq!(records[1].id.as_deref(), Some("b2"));
        assert!(records[1].title.is_empty());
        assert_eq!(records[2].title, "Plant roots");
    }

    #[tokio::test]
    async fn test_http_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let err = source(&server.uri()).fetch_all().await.unwrap_err();
        assert!(matches!(err, CollectionError::Api { status: 403, .. }));
    }
}
