/// Normalization of AI collaborator output into publication records
///
/// Two strategies, tried in order:
///   1. JSON array embedded in the generated text (`title`/`url`/`description`)
///   2. Heuristic pairing of citation URLs with numbered-list titles and
///      unclaimed sentences of the cleaned text
///
/// Only URLs on the domain allow-list survive either strategy.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::ai::text::{clean_response, split_sentences};
use crate::ai::Completion;
use crate::record::{Publication, Tags};

use super::merge::dedup_by_title;

/// Keywords copied into an external record's tags when the text mentions them.
const CONTENT_KEYWORDS: &[&str] = &["microgravity", "space", "experiment", "biology", "research"];

/// Sentences shorter than this are not used as descriptions.
const MIN_DESCRIPTION_CHARS: usize = 20;

const SLICE_CHARS: usize = 100;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```").expect("valid regex"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").expect("valid regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));

/// True when the URL's host is an allow-listed domain or one of its subdomains.
pub fn is_allowed(url: &str, allowed_domains: &[String]) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    allowed_domains.iter().any(|domain| {
        let domain = domain.to_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    })
}

/// Display label for the site a URL belongs to.
pub fn site_label(url: &str) -> &'static str {
    if url.contains("science.nasa.gov") {
        "NASA Science"
    } else if url.contains("ksc.nasa.gov") {
        "NASA KSC"
    } else if url.contains("taskbook") {
        "NASA Task Book"
    } else {
        "NASA External"
    }
}

fn content_tags(content: &str) -> Tags {
    let lower = content.to_lowercase();
    let found: Vec<&str> = CONTENT_KEYWORDS
        .iter()
        .copied()
        .filter(|k| lower.contains(k))
        .collect();
    Tags::Text(found.join(", "))
}

/// Convert one AI completion into at most `max_results` external records.
///
/// Never fails: a completion with nothing usable yields an empty vector.
pub fn normalize(
    completion: &Completion,
    allowed_domains: &[String],
    max_results: usize,
) -> Vec<Publication> {
    let mut records = parse_json_results(&completion.content, allowed_domains);
    let strategy = if records.is_empty() {
        records = extract_from_citations(completion, allowed_domains);
        "citations"
    } else {
        "json"
    };

    let tags = content_tags(&completion.content);
    records.truncate(max_results);
    for (index, record) in records.iter_mut().enumerate() {
        record.relevance = Some(1.0 - index as f64 * 0.1);
        if record.tags.is_empty() {
            record.tags = tags.clone();
        }
    }

    tracing::debug!(
        strategy,
        citations = completion.citations.len(),
        records = records.len(),
        "Normalized external results"
    );

    records
}

// ---------------------------------------------------------------------------
// Strategy 1: embedded JSON array
// ---------------------------------------------------------------------------

fn embedded_array(content: &str) -> Option<Vec<Value>> {
    if let Some(caps) = FENCED_JSON.captures(content) {
        if let Ok(items) = serde_json::from_str::<Vec<Value>>(&caps[1]) {
            return Some(items);
        }
    }
    // Citation markers like `[1]` may precede the array, so try every `[`
    content
        .match_indices('[')
        .filter_map(|(start, _)| {
            serde_json::Deserializer::from_str(&content[start..])
                .into_iter::<Vec<Value>>()
                .next()?
                .ok()
        })
        .find(|items| !items.is_empty() && items.iter().all(Value::is_object))
}

fn string_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Parse a JSON array of `{title, url|link, description|summary|snippet}`.
pub fn parse_json_results(content: &str, allowed_domains: &[String]) -> Vec<Publication> {
    let Some(items) = embedded_array(content) else {
        return Vec::new();
    };

    let records = items
        .iter()
        .filter_map(|item| {
            let title = string_field(item, &["title", "Title"])?;
            let url = string_field(item, &["url", "link", "URL", "Link"])?;
            if !is_allowed(url, allowed_domains) {
                return None;
            }
            let description = string_field(item, &["description", "summary", "snippet"])
                .map(clean_response)
                .unwrap_or_default();
            Some(Publication::external(
                clean_response(title),
                url.to_string(),
                description,
                site_label(url).to_string(),
            ))
        })
        .collect();

    dedup_by_title(records)
}

// ---------------------------------------------------------------------------
// Strategy 2: citation heuristics
// ---------------------------------------------------------------------------

/// Titles of numbered-list items (`1. **Title** - ...`, `2) Title: ...`), in order.
pub fn numbered_titles(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| NUMBERED_ITEM.captures(line))
        .filter_map(|caps| {
            let item = MARKDOWN_LINK.replace_all(&caps[1], "$1").into_owned();
            let title = match BOLD.captures(&item) {
                Some(bold) => bold[1].to_string(),
                None => item
                    .split([':', '–'])
                    .next()
                    .unwrap_or_default()
                    .split(" - ")
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            };
            let title = clean_response(&title)
                .trim_matches(|c: char| c == '"' || c == '*' || c.is_whitespace())
                .to_string();
            (!title.is_empty()).then_some(title)
        })
        .collect()
}

fn content_slice(content: &str, index: usize) -> String {
    let slice: String = content
        .chars()
        .skip(index * SLICE_CHARS)
        .take(SLICE_CHARS)
        .collect();
    format!("{}...", slice)
}

/// Pair each allow-listed citation with a title and a description.
pub fn extract_from_citations(completion: &Completion, allowed_domains: &[String]) -> Vec<Publication> {
    let mut seen = HashSet::new();
    let citations: Vec<&str> = completion
        .citations
        .iter()
        .map(String::as_str)
        .filter(|url| is_allowed(url, allowed_domains))
        .filter(|url| seen.insert(*url))
        .collect();
    if citations.is_empty() {
        return Vec::new();
    }

    let titles = numbered_titles(&completion.content);
    let cleaned = clean_response(&completion.content);
    let body: Vec<&str> = completion
        .content
        .lines()
        .filter(|line| !NUMBERED_ITEM.is_match(line))
        .collect();
    let sentences = split_sentences(&clean_response(&body.join("\n")));
    let mut claimed = vec![false; sentences.len()];
    let mut cursor = 0;

    citations
        .iter()
        .enumerate()
        .map(|(index, url)| {
            let title = titles
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("NASA Result {}", index + 1));

            let next = (cursor..sentences.len()).find(|&i| {
                !claimed[i]
                    && sentences[i].chars().count() >= MIN_DESCRIPTION_CHARS
                    && !sentences[i].contains(&title)
            });
            let description = match next {
                Some(i) => {
                    claimed[i] = true;
                    cursor = i + 1;
                    sentences[i].clone()
                }
                None => content_slice(&cleaned, index),
            };

            Publication::external(title, url.to_string(), description, site_label(url).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Origin;

    fn domains() -> Vec<String> {
        vec![
            "science.nasa.gov".to_string(),
            "public.ksc.nasa.gov".to_string(),
            "taskbook.nasaprs.com".to_string(),
        ]
    }

    #[test]
    fn test_is_allowed() {
        let d = domains();
        assert!(is_allowed("https://science.nasa.gov/biology/x", &d));
        assert!(is_allowed("https://www.science.nasa.gov/x", &d));
        assert!(is_allowed("https://TASKBOOK.nasaprs.com/tbp/index.cfm", &d));
        assert!(!is_allowed("https://example.com/science.nasa.gov", &d));
        assert!(!is_allowed("https://evilscience.nasa.gov/", &d));
        assert!(!is_allowed("not a url", &d));
    }

    #[test]
    fn test_site_labels() {
        assert_eq!(site_label("https://science.nasa.gov/a"), "NASA Science");
        assert_eq!(site_label("https://public.ksc.nasa.gov/a"), "NASA KSC");
        assert_eq!(site_label("https://taskbook.nasaprs.com/a"), "NASA Task Book");
        assert_eq!(site_label("https://nasa.gov/a"), "NASA External");
    }

    #[test]
    fn test_json_strategy_filters_by_allow_list() {
        let content = r#"Here you go:
```json
[
  {"title": "Rodent Research-1", "url": "https://science.nasa.gov/rr1", "description": "Mice on the ISS[1]."},
  {"title": "Blog post", "url": "https://example.com/post", "description": "Not NASA."},
  {"title": "Veggie", "link": "https://public.ksc.nasa.gov/veggie"}
]
```"#;
        let completion = Completion { content: content.to_string(), citations: vec![] };
        let records = normalize(&completion, &domains(), 10);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Rodent Research-1");
        assert_eq!(records[0].impact, "Mice on the ISS.");
        assert_eq!(records[0].origin, Origin::External { site: "NASA Science".into() });
        assert_eq!(records[0].relevance, Some(1.0));
        assert_eq!(records[1].title, "Veggie");
        assert_eq!(records[1].relevance, Some(0.9));
        assert_eq!(records[1].category, "External NASA");
    }

    #[test]
    fn test_bare_array_after_citation_marker() {
        let content = "Studies on bone loss[1]:\n\
            [{\"title\": \"Rodent Research-1\", \"url\": \"https://science.nasa.gov/rr1\"}]\n\
            See also [2].";
        let records = parse_json_results(content, &domains());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Rodent Research-1");
        assert_eq!(records[0].link.as_deref(), Some("https://science.nasa.gov/rr1"));
    }

    #[test]
    fn test_citation_strategy_keeps_only_allow_listed() {
        let completion = Completion {
            content: "1. **Bone Loss in Spaceflight** - overview\n\
                      2. **Plant Habitat** - growth\n\
                      Astronauts lose bone mass during long missions in microgravity. \
                      Plants grown in the Advanced Plant Habitat show altered roots."
                .to_string(),
            citations: vec![
                "https://science.nasa.gov/bone".to_string(),
                "https://wikipedia.org/wiki/Bone".to_string(),
                "https://public.ksc.nasa.gov/aph".to_string(),
                "https://example.com/x".to_string(),
            ],
        };
        let records = normalize(&completion, &domains(), 10);

        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| is_allowed(r.link.as_deref().unwrap(), &domains())));
        assert_eq!(records[0].title, "Bone Loss in Spaceflight");
        assert_eq!(records[1].title, "Plant Habitat");
        assert_eq!(
            records[0].impact,
            "Astronauts lose bone mass during long missions in microgravity."
        );
        assert_eq!(records[0].tags.joined(), "microgravity, space");
    }

    #[test]
    fn test_citation_strategy_placeholder_titles_and_slices() {
        let completion = Completion {
            content: "Short.".to_string(),
            citations: vec![
                "https://science.nasa.gov/a".to_string(),
                "https://science.nasa.gov/b".to_string(),
                "https://science.nasa.gov/a".to_string(),
            ],
        };
        let records = normalize(&completion, &domains(), 10);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "NASA Result 1");
        assert_eq!(records[1].title, "NASA Result 2");
        assert_eq!(records[0].impact, "Short....");
        assert_eq!(records[1].impact, "...");
    }

    #[test]
    fn test_nothing_usable_yields_empty() {
        let completion = Completion {
            content: "I could not find anything.".to_string(),
            citations: vec!["https://example.com".to_string()],
        };
        assert!(normalize(&completion, &domains(), 10).is_empty());
        assert!(normalize(&Completion::default(), &domains(), 10).is_empty());
    }

    #[test]
    fn test_max_results_cap() {
        let citations = (0..15)
            .map(|i| format!("https://science.nasa.gov/{}", i))
            .collect();
        let completion = Completion { content: String::new(), citations };
        assert_eq!(normalize(&completion, &domains(), 10).len(), 10);
    }

    #[test]
    fn test_numbered_titles_formats() {
        let content = "1. **Rodent Research** - mice\n\
                       2) Veggie: lettuce in orbit\n\
                       3. [Twins Study](https://science.nasa.gov/twins) - genome\n\
                       Not a list line";
        assert_eq!(
            numbered_titles(content),
            vec!["Rodent Research", "Veggie", "Twins Study"]
        );
    }
}
