use crate::page::WebPage;
use crate::tokenizer::extract_text;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type DocId = u32;

/// Build-time index entry: a token occurs `frequency` times in `doc_id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: f64, // raw term frequency, never negative
}

/// Query-time relevance of one document. Kept apart from [`Posting`] so a
/// score is never mistaken for a stored frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePostingError(pub String);

impl fmt::Display for ParsePostingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed posting: {}", self.0)
    }
}

impl std::error::Error for ParsePostingError {}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug formatting keeps the ".0" on whole numbers and round-trips exactly.
        write!(f, "{},{:?}", self.doc_id, self.frequency)
    }
}

impl FromStr for Posting {
    type Err = ParsePostingError;

    /// Parses `"<docId>,<frequency>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.trim().split(',');
        let (id, freq) = match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(freq), None) => (id, freq),
            _ => return Err(ParsePostingError(format!("expected 2 fields in {s:?}"))),
        };
        let doc_id = id
            .trim()
            .parse::<DocId>()
            .map_err(|e| ParsePostingError(format!("document id {id:?}: {e}")))?;
        let frequency = freq
            .trim()
            .parse::<f64>()
            .map_err(|e| ParsePostingError(format!("weight {freq:?}: {e}")))?;
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(ParsePostingError(format!("weight {freq:?} must be a non-negative number")));
        }
        Ok(Posting { doc_id, frequency })
    }
}

/// Serializes one token's posting list as `token:id,w;id,w`.
pub fn format_posting_line(token: &str, postings: &[Posting]) -> String {
    let list: Vec<String> = postings.iter().map(Posting::to_string).collect();
    format!("{token}:{}", list.join(";"))
}

/// Splits an index line into its token and parsed postings.
pub fn parse_posting_line(line: &str) -> Result<(&str, Vec<Posting>), ParsePostingError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (token, list) = line
        .split_once(':')
        .ok_or_else(|| ParsePostingError(format!("missing ':' in {line:?}")))?;
    if list.is_empty() {
        return Ok((token, Vec::new()));
    }
    let postings = list.split(';').map(str::parse).collect::<Result<Vec<_>, _>>()?;
    Ok((token, postings))
}

/// Raw term frequency of every body token of one page. This is the unit the
/// offline builder merges into the full index.
pub fn build_postings(page: &WebPage, doc_id: DocId) -> HashMap<String, Posting> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in extract_text(page) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(token, n)| (token, Posting { doc_id, frequency: n as f64 }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posting_round_trips() {
        for p in [
            Posting { doc_id: 0, frequency: 0.0 },
            Posting { doc_id: 7, frequency: 2.0 },
            Posting { doc_id: 42, frequency: 0.1 + 0.2 },
            Posting { doc_id: u32::MAX, frequency: 1e-9 },
        ] {
            assert_eq!(p.to_string().parse::<Posting>().unwrap(), p);
        }
    }

    #[test]
    fn random_postings_round_trip() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let frequency = match rng.gen_range(0..3) {
                0 => rng.gen_range(0..1000) as f64,
                1 => rng.gen::<f64>(),
                _ => rng.gen::<f64>() * 10f64.powi(rng.gen_range(-12..12)),
            };
            let p = Posting { doc_id: rng.gen(), frequency };
            assert_eq!(p.to_string().parse::<Posting>().unwrap(), p);
        }
    }

    #[test]
    fn parses_python_style_weights() {
        let p: Posting = "12,3.0".parse().unwrap();
        assert_eq!(p, Posting { doc_id: 12, frequency: 3.0 });
    }

    #[test]
    fn rejects_malformed_postings() {
        assert!("12".parse::<Posting>().is_err());
        assert!("12,abc".parse::<Posting>().is_err());
        assert!("12,1.0,3".parse::<Posting>().is_err());
        assert!("x,1.0".parse::<Posting>().is_err());
        assert!("1,-2.0".parse::<Posting>().is_err());
        assert!("1,NaN".parse::<Posting>().is_err());
    }

    #[test]
    fn posting_line_format() {
        let postings = vec![Posting { doc_id: 1, frequency: 2.0 }, Posting { doc_id: 2, frequency: 1.0 }];
        let line = format_posting_line("cat", &postings);
        assert_eq!(line, "cat:1,2.0;2,1.0");
        let line_nl = format!("{line}\n");
        let (token, parsed) = parse_posting_line(&line_nl).unwrap();
        assert_eq!(token, "cat");
        assert_eq!(parsed, postings);
    }

    #[test]
    fn posting_line_without_separator_is_rejected() {
        assert!(parse_posting_line("cat 1,2.0").is_err());
        assert!(parse_posting_line("cat:1,2.0;").is_err());
    }

    #[test]
    fn build_postings_counts_body_tokens() {
        let page = WebPage {
            url: "http://a".into(),
            content: "<html><head><title>Cats</title></head><body><p>Cat cat dog</p><script>cat()</script></body></html>".into(),
            encoding: "utf-8".into(),
        };
        let postings = build_postings(&page, 3);
        assert_eq!(postings["cat"], Posting { doc_id: 3, frequency: 2.0 });
        assert_eq!(postings["dog"].frequency, 1.0);
        assert!(!postings.contains_key("cats"));
    }
}
