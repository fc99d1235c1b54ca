use crate::config::SearchConfig;
use crate::error::Result;
use crate::index::DocId;
use crate::persist::IndexStore;
use crate::results::{highlight, top_k, SearchResult};
use crate::search::{merge_phases, QueryPlanner};
use crate::spelling::VocabularyBuckets;
use crate::tokenizer::{stem, tokenize_all};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub corrected: Vec<String>,
    pub stemmed: Vec<String>,
    /// Documents matched before truncation to `top_k`.
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

/// Everything needed to answer queries against one corpus. Offset
/// directories and vocabulary are loaded once; index files are opened per
/// lookup, so a `Searcher` can be shared across threads.
#[derive(Debug)]
pub struct Searcher {
    store: IndexStore,
    vocabulary: VocabularyBuckets,
    config: SearchConfig,
}

impl Searcher {
    pub fn open(config: SearchConfig) -> Result<Self> {
        let paths = config.paths();
        let vocabulary = VocabularyBuckets::load(&paths.vocabulary())?;
        let store = IndexStore::open(paths)?;
        tracing::info!(
            tokens = store.num_tokens(),
            documents = store.num_documents(),
            vocabulary = vocabulary.len(),
            "searcher ready"
        );
        Ok(Self { store, vocabulary, config })
    }

    pub fn store(&self) -> &IndexStore { &self.store }

    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.search_top(query, self.config.top_k)
    }

    pub fn search_top(&self, query: &str, k: usize) -> Result<SearchOutcome> {
        let tokens = tokenize_all(query);
        if tokens.is_empty() {
            return Ok(SearchOutcome {
                query: query.to_string(),
                corrected: vec![],
                stemmed: vec![],
                total_hits: 0,
                results: vec![],
            });
        }
        let corrected = self.vocabulary.correct_all(&tokens);
        let stemmed = stem(&corrected);
        tracing::debug!(?corrected, ?stemmed, "normalized query");

        let planner = QueryPlanner::new(&self.store);
        let exact_hits = planner.run(&corrected)?;
        let stemmed_hits = planner.run(&stemmed)?;
        let merged = merge_phases(exact_hits, stemmed_hits);
        let total_hits = merged.len();

        let mut marks: Vec<String> = Vec::with_capacity(corrected.len() * 2);
        for t in corrected.iter().chain(stemmed.iter()) {
            if !marks.contains(t) {
                marks.push(t.clone());
            }
        }

        let mut results = Vec::new();
        for hit in top_k(merged, k) {
            let page = self.store.load_page(hit.doc_id)?;
            results.push(SearchResult {
                doc_id: hit.doc_id,
                score: hit.score,
                title: page.title(),
                snippets: highlight(&page.text(), &marks, self.config.snippet_window),
                url: page.url,
            });
        }
        Ok(SearchOutcome { query: query.to_string(), corrected, stemmed, total_hits, results })
    }

    /// Url and title of one document.
    pub fn describe(&self, doc_id: DocId) -> Result<(String, String)> {
        let page = self.store.load_page(doc_id)?;
        let title = page.title();
        Ok((page.url, title))
    }
}
