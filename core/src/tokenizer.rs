use crate::page::WebPage;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{M}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Split text into lowercase word tokens using NFKC normalization.
///
/// Stopwords are kept: the index stores every word of the body so that
/// conjunctive queries over common words still resolve.
pub fn tokenize_all(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

/// Indexable tokens of a page body.
pub fn extract_text(page: &WebPage) -> Vec<String> {
    tokenize_all(&page.text())
}

/// Porter-style stemming, token by token and order preserving.
pub fn stem(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| STEMMER.stem(t).into_owned()).collect()
}
