use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use seekdex_core::persist::{write_index, IndexPaths};
use seekdex_core::spelling::VocabularyBuckets;
use seekdex_core::{build_postings, DocId, Posting, WebPage};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the offset-indexed postings layout from crawled pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of crawled page JSON files
    Build {
        /// Input directory (searched recursively for *.json)
        #[arg(long)]
        input: String,
        /// Corpus root; receives indices/ and posting_keys.json
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(Path::new(&input), Path::new(&output)),
    }
}

fn build_index(input: &Path, output: &Path) -> Result<()> {
    if !input.is_dir() {
        bail!("input {} is not a directory", input.display());
    }
    let paths = IndexPaths::new(output);
    fs::create_dir_all(&paths.root)?;

    let files = page_files(input);
    let mut index: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    let mut sources: Vec<String> = Vec::with_capacity(files.len());

    // ids follow sorted path order, so postings are appended in id order
    for (i, file) in files.iter().enumerate() {
        let doc_id = DocId::try_from(i).context("too many documents")?;
        let page = WebPage::from_path(file)?;
        for (token, posting) in build_postings(&page, doc_id) {
            index.entry(token).or_default().push(posting);
        }
        let source = fs::canonicalize(file).with_context(|| format!("resolving {}", file.display()))?;
        sources.push(source.to_string_lossy().into_owned());
        if (i + 1) % 1000 == 0 {
            tracing::info!(documents = i + 1, tokens = index.len(), "progress");
        }
    }
    tracing::info!(num_docs = sources.len(), num_tokens = index.len(), "ingested documents");

    write_index(&paths, &index, &sources)?;
    VocabularyBuckets::from_tokens(index.keys().cloned()).save(&paths.vocabulary())?;

    tracing::info!(output = %paths.root.display(), "index build complete");
    Ok(())
}

fn page_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
