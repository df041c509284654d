/// Publication records
///
/// `RawPublication` mirrors the loose schema stored in the publications
/// collection (capitalized or lowercase keys, tags as string or list).
/// `Publication` is the single canonical shape every source is adapted into
/// before any scoring runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Tags as stored by the collection: either one free-text string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    Text(String),
    List(Vec<String>),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::Text(String::new())
    }
}

impl Tags {
    /// Text used by the relevance scorer and for display.
    pub fn joined(&self) -> String {
        self.join_with(", ")
    }

    pub fn join_with(&self, sep: &str) -> String {
        match self {
            Tags::Text(s) => s.clone(),
            Tags::List(items) => items.join(sep),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Tags::Text(s) => s.trim().is_empty(),
            Tags::List(items) => items.iter().all(|t| t.trim().is_empty()),
        }
    }
}

impl From<&str> for Tags {
    fn from(s: &str) -> Self {
        Tags::Text(s.to_string())
    }
}

/// A publication as returned by the local collection collaborator.
///
/// Documents in the wild carry capitalized keys, lowercase keys, or both; the
/// capitalized spelling wins when it is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawPublication {
    pub id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Link")]
    pub link: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<Tags>,
    #[serde(rename = "Impact")]
    pub impact: Option<String>,
}

/// First non-null, non-empty value among `keys`.
fn first_field(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| {
        fields.remove(*key).filter(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    })
}

fn text_field(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    match first_field(fields, keys)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for RawPublication {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(RawPublication {
            id: text_field(&mut fields, &["id"]),
            title: text_field(&mut fields, &["Title", "title"]),
            link: text_field(&mut fields, &["Link", "link"]),
            category: text_field(&mut fields, &["Category", "category"]),
            tags: first_field(&mut fields, &["Tags", "tags"])
                .and_then(|v| serde_json::from_value::<Tags>(v).ok()),
            impact: text_field(&mut fields, &["Impact", "impact", "summary"]),
        })
    }
}

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    Local,
    /// Citation returned by the AI collaborator; `site` is a display label
    /// such as "NASA Science".
    External { site: String },
}

impl Origin {
    pub fn is_external(&self) -> bool {
        matches!(self, Origin::External { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Origin::Local => "Local Database",
            Origin::External { site } => site,
        }
    }
}

/// Canonical publication record shared by local and external results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: Option<String>,
    pub title: String,
    pub link: Option<String>,
    pub category: String,
    pub tags: Tags,
    pub impact: String,
    #[serde(default)]
    pub description: String,
    pub origin: Origin,
    /// Integer relevance assigned by the scorer
    #[serde(default)]
    pub relevance_score: i64,
    /// Fractional relevance reported for external hits (1.0 = first citation)
    #[serde(default)]
    pub relevance: Option<f64>,
    /// Score used for the final merged ordering
    #[serde(default)]
    pub adjusted_score: i64,
}

impl Publication {
    /// Adapt a raw collection document. Missing fields become empty strings.
    pub fn from_raw(raw: RawPublication) -> Self {
        Publication {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            link: raw.link.filter(|l| !l.trim().is_empty()),
            category: raw.category.unwrap_or_default(),
            tags: raw.tags.unwrap_or_default(),
            impact: raw.impact.unwrap_or_default(),
            description: String::new(),
            origin: Origin::Local,
            relevance_score: 0,
            relevance: None,
            adjusted_score: 0,
        }
    }

    /// Build an external record from a normalized AI citation.
    pub fn external(title: String, link: String, impact: String, site: String) -> Self {
        Publication {
            id: None,
            title,
            link: Some(link),
            category: "External NASA".to_string(),
            tags: Tags::default(),
            description: impact.clone(),
            impact,
            origin: Origin::External { site },
            relevance_score: 0,
            relevance: None,
            adjusted_score: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_accepts_capitalized_and_lowercase_keys() {
        let upper: RawPublication = serde_json::from_value(serde_json::json!({
            "Title": "Bone loss in microgravity",
            "Link": "https://example.org/a",
            "Tags": ["bone", "mice"]
        }))
        .unwrap();
        let lower: RawPublication = serde_json::from_value(serde_json::json!({
            "title": "Plant growth on ISS",
            "category": "Plants",
            "tags": "arabidopsis, roots",
            "impact": "Roots orient without gravity"
        }))
        .unwrap();

        assert_eq!(upper.title.as_deref(), Some("Bone loss in microgravity"));
        assert_eq!(upper.tags, Some(Tags::List(vec!["bone".into(), "mice".into()])));
        assert_eq!(lower.category.as_deref(), Some("Plants"));
        assert_eq!(lower.tags, Some(Tags::Text("arabidopsis, roots".into())));
        assert_eq!(lower.impact.as_deref(), Some("Roots orient without gravity"));
    }

    #[test]
    fn test_raw_with_both_spellings_prefers_capitalized() {
        let raw: RawPublication = serde_json::from_value(serde_json::json!({
            "Title": "Bone loss in mice",
            "title": "bone loss in mice",
            "Impact": "",
            "impact": "Rapid trabecular loss",
            "summary": "unused",
            "Tags": null,
            "tags": ["bone"],
            "id": 42
        }))
        .unwrap();

        assert_eq!(raw.title.as_deref(), Some("Bone loss in mice"));
        assert_eq!(raw.impact.as_deref(), Some("Rapid trabecular loss"));
        assert_eq!(raw.tags, Some(Tags::List(vec!["bone".into()])));
        assert_eq!(raw.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_from_raw_fills_missing_fields_with_empty() {
        let publication = Publication::from_raw(RawPublication {
            title: Some("Only a title".into()),
            link: Some("  ".into()),
            ..Default::default()
        });

        assert_eq!(publication.title, "Only a title");
        assert_eq!(publication.link, None);
        assert_eq!(publication.category, "");
        assert!(publication.tags.is_empty());
        assert_eq!(publication.origin, Origin::Local);
    }

    #[test]
    fn test_tags_joined() {
        assert_eq!(Tags::List(vec!["a".into(), "b".into()]).joined(), "a, b");
        assert_eq!(Tags::List(vec!["a".into(), "b".into()]).join_with(" "), "a b");
        assert_eq!(Tags::from("x, y").joined(), "x, y");
    }

    #[test]
    fn test_origin_labels() {
        assert_eq!(Origin::Local.label(), "Local Database");
        let ext = Origin::External { site: "NASA KSC".into() };
        assert!(ext.is_external());
        assert_eq!(ext.label(), "NASA KSC");
    }
}
