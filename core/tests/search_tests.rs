use seekdex_core::persist::{write_index, IndexPaths};
use seekdex_core::spelling::VocabularyBuckets;
use seekdex_core::{Posting, SearchConfig, SearchError, Searcher};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn page_json(url: &str, title: &str, body: &str) -> String {
    serde_json::json!({
        "url": url,
        "content": format!("<html><head><title>{title}</title></head><body>{body}</body></html>"),
        "encoding": "utf-8",
    })
    .to_string()
}

/// Writes pages under `pages/` and the index files from explicit postings.
fn build_corpus(dir: &Path, pages: &[(&str, &str, &str)], postings: &[(&str, Vec<(u32, f64)>)]) -> IndexPaths {
    let paths = IndexPaths::new(dir);
    fs::create_dir_all(dir.join("pages")).unwrap();
    let mut sources = Vec::new();
    for (i, (url, title, body)) in pages.iter().enumerate() {
        let rel = format!("pages/{i}.json");
        fs::write(dir.join(&rel), page_json(url, title, body)).unwrap();
        sources.push(rel);
    }
    let mut index: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    for (token, list) in postings {
        let list = list.iter().map(|&(doc_id, frequency)| Posting { doc_id, frequency }).collect();
        index.insert(token.to_string(), list);
    }
    write_index(&paths, &index, &sources).unwrap();
    VocabularyBuckets::from_tokens(index.keys().cloned()).save(&paths.vocabulary()).unwrap();
    paths
}

fn pets(dir: &Path) -> Searcher {
    build_corpus(
        dir,
        &[
            ("http://zero", "Nothing", "birds only"),
            ("http://one", "Pets", "my cat chased the dog"),
            ("http://two", "Felines", "a cat sat"),
        ],
        &[("cat", vec![(1, 2.0), (2, 1.0)]), ("dog", vec![(1, 3.0)]), ("birds", vec![(0, 1.0)])],
    );
    Searcher::open(SearchConfig::new(dir)).unwrap()
}

#[test]
fn conjunctive_query_scores_summed_weights() {
    let dir = tempdir().unwrap();
    let searcher = pets(dir.path());
    let out = searcher.search("cat dog").unwrap();
    assert_eq!(out.total_hits, 1);
    assert_eq!(out.results.len(), 1);
    let hit = &out.results[0];
    assert_eq!(hit.doc_id, 1);
    assert_eq!(hit.score, 5.0);
    assert_eq!(hit.url, "http://one");
    assert_eq!(hit.title, "Pets");
    assert_eq!(hit.snippets[0], "my <em>cat</em> chased the dog");
}

#[test]
fn title_match_adds_bonus() {
    let dir = tempdir().unwrap();
    build_corpus(
        dir.path(),
        &[("http://a", "Cat pictures", "cat"), ("http://b", "Other", "cat cat")],
        &[("cat", vec![(0, 1.0), (1, 2.0)])],
    );
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let out = searcher.search("cat").unwrap();
    let scores: Vec<(u32, f64)> = out.results.iter().map(|r| (r.doc_id, r.score)).collect();
    assert_eq!(scores, vec![(0, 31.0), (1, 2.0)]);
}

#[test]
fn unknown_token_alone_matches_nothing() {
    let dir = tempdir().unwrap();
    let searcher = pets(dir.path());
    let out = searcher.search("zebra").unwrap();
    assert_eq!(out.corrected, vec!["zebra"]);
    assert_eq!(out.total_hits, 0);
    assert!(out.results.is_empty());
}

#[test]
fn unknown_token_does_not_veto_others() {
    let dir = tempdir().unwrap();
    let searcher = pets(dir.path());
    let out = searcher.search("cat zebra").unwrap();
    let ids: Vec<u32> = out.results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn empty_query_is_not_an_error() {
    let dir = tempdir().unwrap();
    let searcher = pets(dir.path());
    for q in ["", "   ", "?!"] {
        let out = searcher.search(q).unwrap();
        assert_eq!(out.total_hits, 0);
        assert!(out.results.is_empty());
    }
}

#[test]
fn misspelled_token_is_corrected() {
    let dir = tempdir().unwrap();
    let searcher = pets(dir.path());
    let out = searcher.search("dgo").unwrap();
    assert_eq!(out.corrected, vec!["dog"]);
    assert_eq!(out.results[0].doc_id, 1);
}

#[test]
fn stemmed_phase_finds_root_and_overwrites_shared_ids() {
    let dir = tempdir().unwrap();
    build_corpus(
        dir.path(),
        &[
            ("http://a", "A", "running fast"),
            ("http://b", "B", "we run"),
            ("http://c", "C", "running to run"),
        ],
        &[("running", vec![(0, 1.0), (2, 1.0)]), ("run", vec![(1, 4.0), (2, 7.0)])],
    );
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let out = searcher.search("running").unwrap();
    assert_eq!(out.stemmed, vec!["run"]);
    let scores: Vec<(u32, f64)> = out.results.iter().map(|r| (r.doc_id, r.score)).collect();
    // doc 2 matched both phases and keeps the stemmed-phase score
    assert_eq!(scores, vec![(2, 7.0), (1, 4.0), (0, 1.0)]);
}

#[test]
fn ranking_is_stable_across_runs() {
    let dir = tempdir().unwrap();
    build_corpus(
        dir.path(),
        &[("http://a", "A", "tie"), ("http://b", "B", "tie"), ("http://c", "C", "tie")],
        &[("tie", vec![(2, 1.0), (0, 1.0), (1, 1.0)])],
    );
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let first = serde_json::to_string(&searcher.search("tie").unwrap()).unwrap();
    let second = serde_json::to_string(&searcher.search("tie").unwrap()).unwrap();
    assert_eq!(first, second);
    let ids: Vec<u32> = searcher.search("tie").unwrap().results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn top_k_truncates_but_counts_all_hits() {
    let dir = tempdir().unwrap();
    build_corpus(
        dir.path(),
        &[("http://a", "A", "x"), ("http://b", "B", "x"), ("http://c", "C", "x")],
        &[("xylophone", vec![(0, 3.0), (1, 2.0), (2, 1.0)])],
    );
    let searcher = Searcher::open(SearchConfig::new(dir.path()).with_top_k(2)).unwrap();
    let out = searcher.search("xylophone").unwrap();
    assert_eq!(out.total_hits, 3);
    assert_eq!(out.results.len(), 2);
}

#[test]
fn posting_for_unknown_document_is_integrity_error() {
    let dir = tempdir().unwrap();
    build_corpus(dir.path(), &[("http://a", "A", "ghost")], &[("ghost", vec![(0, 1.0), (9, 1.0)])]);
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let err = searcher.search("ghost").unwrap_err();
    assert!(matches!(err, SearchError::MissingDocument(9)));
}

#[test]
fn unreadable_payload_is_surfaced() {
    let dir = tempdir().unwrap();
    build_corpus(dir.path(), &[("http://a", "A", "lost")], &[("lost", vec![(0, 1.0)])]);
    fs::remove_file(dir.path().join("pages/0.json")).unwrap();
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let err = searcher.search("lost").unwrap_err();
    assert!(matches!(err, SearchError::DocumentUnreadable { .. }));
}

#[test]
fn corrupt_posting_line_is_surfaced() {
    let dir = tempdir().unwrap();
    let paths = build_corpus(dir.path(), &[("http://a", "A", "x")], &[("bad", vec![(0, 1.0)])]);
    fs::write(paths.postings(), "bad:0,one\n").unwrap();
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    assert!(matches!(searcher.search("bad").unwrap_err(), SearchError::CorruptIndex { .. }));
}

#[test]
fn missing_vocabulary_means_index_unavailable() {
    let dir = tempdir().unwrap();
    let paths = build_corpus(dir.path(), &[("http://a", "A", "x")], &[("x", vec![(0, 1.0)])]);
    fs::remove_file(paths.vocabulary()).unwrap();
    assert!(matches!(
        Searcher::open(SearchConfig::new(dir.path())).unwrap_err(),
        SearchError::IndexUnavailable { .. }
    ));
}

#[test]
fn concurrent_queries_match_sequential_answers() {
    let dir = tempdir().unwrap();
    build_corpus(
        dir.path(),
        &[
            ("http://zero", "Nothing", "birds only"),
            ("http://one", "Pets", "my cat chased the dog"),
            ("http://two", "Felines", "a cat sat"),
            ("http://three", "Dogs", "dog days"),
        ],
        &[
            ("birds", vec![(0, 1.0)]),
            ("cat", vec![(1, 2.0), (2, 1.0)]),
            ("dog", vec![(1, 3.0), (3, 2.0)]),
            ("sat", vec![(2, 1.0)]),
        ],
    );
    let searcher = Searcher::open(SearchConfig::new(dir.path())).unwrap();
    let queries = ["cat", "dog", "cat dog", "birds", "sat cat", "dgo", "zebra"];
    let expected: Vec<String> = queries
        .iter()
        .map(|q| serde_json::to_string(&searcher.search(q).unwrap().results).unwrap())
        .collect();

    // every thread interleaves lookups on the same files
    std::thread::scope(|scope| {
        for t in 0..8 {
            let searcher = &searcher;
            let expected = &expected;
            scope.spawn(move || {
                for round in 0..40 {
                    let i = (t + round) % queries.len();
                    let got = serde_json::to_string(&searcher.search(queries[i]).unwrap().results).unwrap();
                    assert_eq!(got, expected[i], "query {:?}", queries[i]);
                }
            });
        }
    });
}
