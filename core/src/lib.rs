pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod page;
pub mod persist;
pub mod results;
pub mod search;
pub mod spelling;
pub mod tokenizer;

pub use config::SearchConfig;
pub use engine::{SearchOutcome, Searcher};
pub use error::{Result, SearchError};
pub use index::*;
pub use page::WebPage;
