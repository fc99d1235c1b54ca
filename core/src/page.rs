use crate::error::{Result, SearchError};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;

lazy_static! {
    static ref WS: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref TITLE: Selector = Selector::parse("title").expect("valid selector");
}

/// Elements whose text never counts as indexable body text.
const SKIPPED: &[&str] = &["style", "script", "head", "title"];

/// A crawled page payload as written by the crawler, one JSON file per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,
    /// Raw markup.
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl WebPage {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| SearchError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SearchError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Contents of `<title>`, whitespace collapsed. Empty when absent.
    pub fn title(&self) -> String {
        let html = Html::parse_document(&self.content);
        let raw = html
            .select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();
        collapse_ws(&raw)
    }

    /// Body text strings in document order, skipping style, script and head content.
    pub fn text_strings(&self) -> Vec<String> {
        let html = Html::parse_document(&self.content);
        let mut out = Vec::new();
        for node in html.root_element().descendants() {
            let Some(text) = node.value().as_text() else { continue };
            let hidden = node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|el| SKIPPED.contains(&el.name()));
            if hidden {
                continue;
            }
            let s = collapse_ws(text);
            if !s.is_empty() {
                out.push(s);
            }
        }
        out
    }

    /// Body text joined by single spaces.
    pub fn text(&self) -> String {
        self.text_strings().join(" ")
    }
}

fn collapse_ws(s: &str) -> String {
    WS.replace_all(s, " ").trim().to_string()
}
