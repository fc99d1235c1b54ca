use crate::error::{Result, SearchError};
use crate::index::{format_posting_line, parse_posting_line, DocId, Posting};
use crate::page::WebPage;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::fs::{create_dir_all, File};
use std::hash::Hash;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Locations of the on-disk layout under one corpus root.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn indices_dir(&self) -> PathBuf { self.root.join("indices") }
    pub fn postings(&self) -> PathBuf { self.indices_dir().join("index.txt") }
    pub fn postings_directory(&self) -> PathBuf { self.indices_dir().join("index_of_index.txt") }
    pub fn locations(&self) -> PathBuf { self.indices_dir().join("crawled.txt") }
    pub fn locations_directory(&self) -> PathBuf { self.indices_dir().join("index_of_crawled.txt") }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("posting_keys.json") }

    /// Source paths stored relative to the corpus root are resolved against it.
    pub fn resolve_source(&self, stored: &str) -> PathBuf {
        let p = Path::new(stored);
        if p.is_absolute() { p.to_path_buf() } else { self.root.join(p) }
    }
}

/// Key to byte offset of the line starting with that key.
#[derive(Debug, Clone)]
pub struct OffsetDirectory<K> {
    offsets: HashMap<K, u64>,
}

impl<K> OffsetDirectory<K>
where
    K: Eq + Hash + FromStr,
    K::Err: Display,
{
    /// Reads `key,offset` lines. The last comma separates the offset.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| SearchError::unavailable(path, e))?;
        let mut reader = BufReader::new(file);
        let mut offsets = HashMap::new();
        let mut buf = Vec::new();
        let mut pos = 0u64;
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| SearchError::unavailable(path, e))?;
            if n == 0 {
                break;
            }
            let here = pos;
            pos += n as u64;
            let line = decode_line(path, here, &buf)?;
            if line.trim().is_empty() {
                continue;
            }
            let (key, offset) = line
                .rsplit_once(',')
                .ok_or_else(|| SearchError::corrupt(path, here, format!("no ',' in {line:?}")))?;
            let key = key
                .parse::<K>()
                .map_err(|e| SearchError::corrupt(path, here, format!("key {key:?}: {e}")))?;
            let offset = offset
                .trim()
                .parse::<u64>()
                .map_err(|e| SearchError::corrupt(path, here, format!("offset {offset:?}: {e}")))?;
            offsets.insert(key, offset);
        }
        Ok(Self { offsets })
    }
}

impl<K: Eq + Hash> OffsetDirectory<K> {
    pub fn from_map(offsets: HashMap<K, u64>) -> Self {
        Self { offsets }
    }

    pub fn offset<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.offsets.get(key).copied()
    }

    pub fn len(&self) -> usize { self.offsets.len() }
    pub fn is_empty(&self) -> bool { self.offsets.is_empty() }
}

/// Opens its own handle, seeks, reads one line and closes. Handles are never
/// shared between callers, so concurrent lookups cannot interleave seeks.
fn read_line_at(path: &Path, offset: u64) -> Result<String> {
    let mut file = File::open(path).map_err(|e| SearchError::unavailable(path, e))?;
    file.seek(SeekFrom::Start(offset)).map_err(|e| SearchError::unavailable(path, e))?;
    let mut buf = Vec::new();
    let n = BufReader::new(file)
        .read_until(b'\n', &mut buf)
        .map_err(|e| SearchError::unavailable(path, e))?;
    if n == 0 {
        return Err(SearchError::corrupt(path, offset, "offset points past end of file"));
    }
    decode_line(path, offset, &buf)
}

/// A line that is not UTF-8 is a damaged index, not an unreadable one.
fn decode_line(path: &Path, offset: u64, raw: &[u8]) -> Result<String> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| SearchError::corrupt(path, offset, format!("invalid UTF-8: {e}")))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Posting list of `token`, or empty when the directory does not know it.
pub fn lookup_postings(token: &str, directory: &OffsetDirectory<String>, postings_file: &Path) -> Result<Vec<Posting>> {
    let Some(offset) = directory.offset(token) else {
        return Ok(Vec::new());
    };
    let line = read_line_at(postings_file, offset)?;
    let (found, postings) =
        parse_posting_line(&line).map_err(|e| SearchError::corrupt(postings_file, offset, e.to_string()))?;
    if found != token {
        return Err(SearchError::corrupt(
            postings_file,
            offset,
            format!("expected token {token:?}, found {found:?}"),
        ));
    }
    Ok(postings)
}

/// Stored source path of `doc_id`. An unknown id means the index and corpus disagree.
pub fn resolve_document_path(doc_id: DocId, directory: &OffsetDirectory<DocId>, location_file: &Path) -> Result<String> {
    let offset = directory.offset(&doc_id).ok_or(SearchError::MissingDocument(doc_id))?;
    let line = read_line_at(location_file, offset)?;
    let stored = line.trim();
    if stored.is_empty() {
        return Err(SearchError::corrupt(location_file, offset, format!("empty location for document {doc_id}")));
    }
    Ok(stored.to_string())
}

/// Read-only view over one corpus: both offset directories are loaded once,
/// file bodies are read per lookup.
#[derive(Debug)]
pub struct IndexStore {
    paths: IndexPaths,
    token_offsets: OffsetDirectory<String>,
    doc_offsets: OffsetDirectory<DocId>,
}

impl IndexStore {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let token_offsets = OffsetDirectory::load(&paths.postings_directory())?;
        let doc_offsets = OffsetDirectory::load(&paths.locations_directory())?;
        tracing::debug!(tokens = token_offsets.len(), documents = doc_offsets.len(), root = %paths.root.display(), "opened index");
        Ok(Self { paths, token_offsets, doc_offsets })
    }

    pub fn paths(&self) -> &IndexPaths { &self.paths }

    pub fn num_tokens(&self) -> usize { self.token_offsets.len() }

    pub fn num_documents(&self) -> usize { self.doc_offsets.len() }

    pub fn lookup_postings(&self, token: &str) -> Result<Vec<Posting>> {
        lookup_postings(token, &self.token_offsets, &self.paths.postings())
    }

    pub fn resolve_document_path(&self, doc_id: DocId) -> Result<PathBuf> {
        let stored = resolve_document_path(doc_id, &self.doc_offsets, &self.paths.locations())?;
        Ok(self.paths.resolve_source(&stored))
    }

    pub fn load_page(&self, doc_id: DocId) -> Result<WebPage> {
        WebPage::from_path(&self.resolve_document_path(doc_id)?)
    }
}

/// Writes `index.txt`, `crawled.txt` and both offset directories in one pass.
/// `sources[i]` is the source path of document `i`.
pub fn write_index(paths: &IndexPaths, postings: &BTreeMap<String, Vec<Posting>>, sources: &[String]) -> Result<()> {
    create_dir_all(paths.indices_dir())?;

    let mut index = BufWriter::new(File::create(paths.postings())?);
    let mut index_of_index = BufWriter::new(File::create(paths.postings_directory())?);
    let mut offset = 0u64;
    for (token, list) in postings {
        let line = format_posting_line(token, list);
        writeln!(index, "{line}")?;
        writeln!(index_of_index, "{token},{offset}")?;
        offset += line.len() as u64 + 1;
    }
    index.flush()?;
    index_of_index.flush()?;

    let mut crawled = BufWriter::new(File::create(paths.locations())?);
    let mut index_of_crawled = BufWriter::new(File::create(paths.locations_directory())?);
    let mut offset = 0u64;
    for (doc_id, source) in sources.iter().enumerate() {
        writeln!(crawled, "{source}")?;
        writeln!(index_of_crawled, "{doc_id},{offset}")?;
        offset += source.len() as u64 + 1;
    }
    crawled.flush()?;
    index_of_crawled.flush()?;
    Ok(())
}
