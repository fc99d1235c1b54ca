//! Approximate spelling correction against the index vocabulary.
//!
//! Candidates come only from the bucket sharing the query token's first
//! character. Similarity is the Ratcliff/Obershelp ratio `2*M / (|a| + |b|)`,
//! where `M` counts characters in the recursively found longest common blocks.

use crate::error::{Result, SearchError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Candidates scoring below this are never suggested.
pub const SIMILARITY_FLOOR: f64 = 0.6;

/// First character to known tokens starting with it, in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct VocabularyBuckets {
    buckets: HashMap<char, Vec<String>>,
}

impl VocabularyBuckets {
    /// Buckets built from the token universe; each bucket is sorted and de-duplicated.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: BTreeMap<char, BTreeSet<String>> = BTreeMap::new();
        for token in tokens {
            let token = token.into();
            if let Some(first) = token.chars().next() {
                sorted.entry(first).or_default().insert(token);
            }
        }
        let buckets = sorted.into_iter().map(|(c, set)| (c, set.into_iter().collect())).collect();
        Self { buckets }
    }

    /// Reads `posting_keys.json`. Bucket order is kept as written.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| SearchError::unavailable(path, e))?;
        let parsed: HashMap<String, Vec<String>> =
            serde_json::from_str(&raw).map_err(|e| SearchError::corrupt(path, 0, e.to_string()))?;
        let mut buckets: HashMap<char, Vec<String>> = HashMap::new();
        for (key, tokens) in parsed {
            if let Some(first) = key.chars().next() {
                buckets.entry(first).or_default().extend(tokens);
            }
        }
        Ok(Self { buckets })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let ordered: BTreeMap<String, &Vec<String>> =
            self.buckets.iter().map(|(c, tokens)| (c.to_string(), tokens)).collect();
        let json = serde_json::to_string(&ordered).map_err(std::io::Error::from)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn bucket(&self, first: char) -> Option<&[String]> {
        self.buckets.get(&first).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Closest known token, or `token` itself when nothing clears the floor.
    pub fn correct(&self, token: &str) -> String {
        let Some(candidates) = token.chars().next().and_then(|c| self.bucket(c)) else {
            return token.to_string();
        };
        let query: Vec<char> = token.chars().collect();
        let mut best: Option<(&str, f64)> = None;
        for candidate in candidates {
            let cand: Vec<char> = candidate.chars().collect();
            let bound = upper_bound(query.len(), cand.len());
            match best {
                Some((_, score)) if bound <= score => continue,
                None if bound < SIMILARITY_FLOOR => continue,
                _ => {}
            }
            let score = ratio(&query, &cand);
            // strictly better only, so ties keep the earliest candidate
            if score >= SIMILARITY_FLOOR && best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate.as_str(), score));
            }
        }
        match best {
            Some((found, _)) => found.to_string(),
            None => token.to_string(),
        }
    }

    pub fn correct_all(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().map(|t| self.correct(t)).collect()
    }
}

fn upper_bound(la: usize, lb: usize) -> f64 {
    if la + lb == 0 { 1.0 } else { 2.0 * la.min(lb) as f64 / (la + lb) as f64 }
}

/// Ratcliff/Obershelp similarity in `[0, 1]`.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / (a.len() + b.len()) as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`; the earliest in
/// `a`, then in `b`, wins among equally long blocks.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            cur[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            let k = cur[col];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}
