use crate::error::Result;
use crate::index::{DocId, Posting, ScoredDocument};
use crate::persist::IndexStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Added once per (title word, query token) pair where the word contains the token.
pub const TITLE_BONUS: f64 = 30.0;

/// Documents present in every non-empty posting list. Tokens without
/// postings do not veto a document; with no postings at all nothing matches.
pub fn intersect_documents(posting_lists: &[Vec<Posting>]) -> BTreeSet<DocId> {
    let mut sets = posting_lists
        .iter()
        .filter(|list| !list.is_empty())
        .map(|list| list.iter().map(|p| p.doc_id).collect::<BTreeSet<DocId>>());
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first, |acc, set| acc.intersection(&set).copied().collect())
}

/// Substring matches of query tokens inside lowercased title words.
pub fn title_bonus(tokens: &[String], title: &str) -> f64 {
    let mut bonus = 0.0;
    for word in title.split_whitespace().map(str::to_lowercase) {
        for token in tokens {
            if word.contains(token.as_str()) {
                bonus += TITLE_BONUS;
            }
        }
    }
    bonus
}

/// Stored frequencies of the document's postings plus its title bonus.
pub fn score(postings_for_doc: &[Posting], tokens: &[String], title: &str) -> f64 {
    let base: f64 = postings_for_doc.iter().map(|p| p.frequency).sum();
    base + title_bonus(tokens, title)
}

/// One entry per document id. Where both phases found a document the
/// stemmed-phase score replaces the exact-phase score.
pub fn merge_phases(exact: Vec<ScoredDocument>, stemmed: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    let mut merged: BTreeMap<DocId, f64> = BTreeMap::new();
    for hit in exact.into_iter().chain(stemmed) {
        merged.insert(hit.doc_id, hit.score);
    }
    merged.into_iter().map(|(doc_id, score)| ScoredDocument { doc_id, score }).collect()
}

/// Resolves, intersects and scores one token variant of a query.
pub struct QueryPlanner<'a> {
    store: &'a IndexStore,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self { store }
    }

    /// One posting list per token in input order; unknown tokens give an empty list.
    pub fn resolve(&self, tokens: &[String]) -> Result<Vec<Vec<Posting>>> {
        tokens.iter().map(|t| self.store.lookup_postings(t)).collect()
    }

    /// Scores every candidate. Each document's title is read from its page.
    pub fn rank_candidates(
        &self,
        doc_ids: &BTreeSet<DocId>,
        posting_lists: &[Vec<Posting>],
        tokens: &[String],
    ) -> Result<Vec<ScoredDocument>> {
        let mut by_doc: HashMap<DocId, Vec<Posting>> = HashMap::new();
        for posting in posting_lists.iter().flatten() {
            if doc_ids.contains(&posting.doc_id) {
                by_doc.entry(posting.doc_id).or_default().push(*posting);
            }
        }
        let mut ranked = Vec::with_capacity(doc_ids.len());
        for &doc_id in doc_ids {
            let title = self.store.load_page(doc_id)?.title();
            let postings = by_doc.get(&doc_id).map(Vec::as_slice).unwrap_or_default();
            ranked.push(ScoredDocument { doc_id, score: score(postings, tokens, &title) });
        }
        Ok(ranked)
    }

    pub fn run(&self, tokens: &[String]) -> Result<Vec<ScoredDocument>> {
        let lists = self.resolve(tokens)?;
        let candidates = intersect_documents(&lists);
        tracing::debug!(?tokens, candidates = candidates.len(), "planned phase");
        self.rank_candidates(&candidates, &lists, tokens)
    }
}
