use crate::index::{DocId, ScoredDocument};
use serde::Serialize;

pub const MARK_OPEN: &str = "<em>";
pub const MARK_CLOSE: &str = "</em>";

/// Characters removed from snippets so they stay on one line and cannot
/// collide with the highlight markers.
const STRIPPED: &[char] = &['\n', '\r', '<', '>', '#'];

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub url: String,
    pub title: String,
    pub snippets: Vec<String>,
}

/// Highest scores first; equal scores by ascending document id.
pub fn top_k(mut merged: Vec<ScoredDocument>, k: usize) -> Vec<ScoredDocument> {
    merged.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    merged.truncate(k);
    merged
}

/// One snippet per token found in `text`: up to `window` characters either
/// side of the first case-insensitive occurrence, with the hit marked.
pub fn highlight(text: &str, tokens: &[String], window: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    // one char per char so positions line up with `chars`
    let lower: Vec<char> = chars.iter().copied().map(fold).collect();
    let mut snippets = Vec::new();
    for token in tokens {
        let needle: Vec<char> = token.chars().map(fold).collect();
        if needle.is_empty() || needle.len() > lower.len() {
            continue;
        }
        let Some(pos) = lower.windows(needle.len()).position(|w| w == needle.as_slice()) else {
            continue;
        };
        let end = pos + needle.len();
        let before = &chars[pos.saturating_sub(window)..pos];
        let after = &chars[end..(end + window).min(chars.len())];
        snippets.push(format!(
            "{}{MARK_OPEN}{}{MARK_CLOSE}{}",
            clean(before),
            clean(&chars[pos..end]),
            clean(after)
        ));
    }
    snippets
}

/// Case fold applied identically to text and tokens. Final sigma folds to
/// sigma because per-character lowercasing cannot see word ends.
fn fold(c: char) -> char {
    match c.to_lowercase().next().unwrap_or(c) {
        'ς' => 'σ',
        lower => lower,
    }
}

fn clean(chars: &[char]) -> String {
    chars.iter().filter(|c| !STRIPPED.contains(c)).collect()
}
