/// Plain-text cleanup for AI collaborator responses.
///
/// | Rule                                   | Input                     | Output              |
/// |----------------------------------------|---------------------------|---------------------|
/// | strip citation markers `[n]`           | `Bone loss[1][2] occurs.` | `Bone loss occurs.` |
/// | strip range markers `[n-m]`            | `Shown before[3-5].`      | `Shown before.`     |
/// | collapse whitespace                    | `a  \n b`                 | `a b`               |
/// | no space before punctuation            | `mice , rats .`           | `mice, rats.`       |
/// | space after punctuation before capital | `done.Next`               | `done. Next`        |

use regex::Regex;
use std::sync::LazyLock;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+(?:-\d+)?\]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:!?])").expect("valid regex"));
static MISSING_SPACE_AFTER_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,;:!?])([A-Z])").expect("valid regex"));

/// Apply every cleanup rule in table order.
pub fn clean_response(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = CITATION_MARKER.replace_all(text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(text.trim(), "$1");
    MISSING_SPACE_AFTER_PUNCT
        .replace_all(&text, "$1 $2")
        .into_owned()
}

/// Split cleaned text into sentences ending in `.`, `!` or `?`.
///
/// A trailing fragment without terminal punctuation is kept as a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if at_boundary || c == '\n' {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
