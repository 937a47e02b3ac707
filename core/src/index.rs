use crate::error::IndexError;
use crate::lock::ReadWriteLock;
use crate::search::SearchResult;
use crate::stats::IndexStats;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;

/// Positions of one word inside each document, keyed by document identifier.
pub type Postings = BTreeMap<String, Vec<usize>>;

/// word -> document -> 1-based positions.
///
/// Both levels are ordered so prefix lookups are range scans and output is
/// deterministic. Not synchronized; this is the per-task local index. The
/// shared one is [`ConcurrentIndex`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    words: BTreeMap<String, Postings>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add_word(&mut self, word: &str, document: &str, position: usize) {
        self.words.entry(word.to_owned()).or_default().entry(document.to_owned()).or_default().push(position);
    }

    /// Adds `words` in order starting at `start`, returning the next free position.
    pub fn add_words<S: AsRef<str>>(&mut self, document: &str, words: &[S], start: usize) -> usize {
        let mut position = start;
        for word in words {
            self.add_word(word.as_ref(), document, position);
            position += 1;
        }
        position
    }

    /// Moves everything in `other` into this index. Where both sides hold the
    /// same word and document, `other`'s positions are appended after ours.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (word, postings) in other.words {
            match self.words.get_mut(&word) {
                None => {
                    self.words.insert(word, postings);
                }
                Some(existing) => {
                    for (document, positions) in postings {
                        existing.entry(document).or_default().extend(positions);
                    }
                }
            }
        }
    }

    /// Ranks every document containing a word that starts with any of the
    /// query words.
    pub fn partial_search<S: AsRef<str>>(&self, queries: &[S]) -> Vec<SearchResult> {
        self.rank(queries, |query| {
            self.words
                .range::<str, _>((Bound::Included(query), Bound::Unbounded))
                .take_while(move |(word, _)| word.starts_with(query))
                .map(|(_, postings)| postings)
                .collect()
        })
    }

    /// Ranks every document containing one of the query words verbatim.
    pub fn exact_search<S: AsRef<str>>(&self, queries: &[S]) -> Vec<SearchResult> {
        self.rank(queries, |query| self.words.get(query).into_iter().collect())
    }

    fn rank<'a, S, F>(&'a self, queries: &[S], mut matches: F) -> Vec<SearchResult>
    where
        S: AsRef<str>,
        F: FnMut(&str) -> Vec<&'a Postings>,
    {
        let mut found: HashMap<&str, SearchResult> = HashMap::new();
        for query in queries {
            let query: &str = query.as_ref();
            if query.is_empty() {
                continue;
            }
            for postings in matches(query) {
                for (document, positions) in postings {
                    let Some(&first) = positions.first() else { continue };
                    found
                        .entry(document.as_str())
                        .and_modify(|r| {
                            r.add_frequency(positions.len());
                            r.update_position(first);
                        })
                        .or_insert_with(|| SearchResult::new(document.as_str(), positions.len(), first));
                }
            }
        }
        let mut results: Vec<SearchResult> = found.into_values().collect();
        results.sort();
        results
    }

    /// Writes the index in its text form: each word on its own line, followed
    /// by one `"document", p1, p2, ...` line per document and a blank line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (word, postings) in &self.words {
            writeln!(out, "{word}")?;
            for (document, positions) in postings {
                write!(out, "\"{document}\"")?;
                for position in positions {
                    write!(out, ", {position}")?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }
        writeln!(out)
    }

    pub fn contains(&self, word: &str) -> bool { self.words.contains_key(word) }

    pub fn positions(&self, word: &str, document: &str) -> Option<&[usize]> {
        self.words.get(word)?.get(document).map(Vec::as_slice)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ { self.words.keys().map(String::as_str) }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    pub fn stats(&self) -> IndexStats {
        let mut documents = BTreeSet::new();
        let mut positions = 0;
        for postings in self.words.values() {
            for (document, list) in postings {
                documents.insert(document.as_str());
                positions += list.len();
            }
        }
        IndexStats { words: self.words.len(), documents: documents.len(), positions }
    }
}

/// The index shared by all workers of a build.
///
/// Every call holds the lock for its whole duration, so readers see an index
/// either before or after any single `add_word` or `merge`, never in between.
#[derive(Debug, Default)]
pub struct ConcurrentIndex {
    inner: ReadWriteLock<InvertedIndex>,
}

impl ConcurrentIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add_word(&self, word: &str, document: &str, position: usize) {
        self.inner.write().add_word(word, document, position);
    }

    pub fn merge(&self, other: InvertedIndex) {
        if other.is_empty() {
            return;
        }
        self.inner.write().merge(other);
    }

    pub fn partial_search<S: AsRef<str>>(&self, queries: &[S]) -> Vec<SearchResult> {
        self.inner.read().partial_search(queries)
    }

    pub fn exact_search<S: AsRef<str>>(&self, queries: &[S]) -> Vec<SearchResult> {
        self.inner.read().exact_search(queries)
    }

    pub fn contains(&self, word: &str) -> bool { self.inner.read().contains(word) }

    pub fn stats(&self) -> IndexStats { self.inner.read().stats() }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.inner.read().write_to(out)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), IndexError> {
        let output = |source| IndexError::Output { path: path.to_path_buf(), source };
        let mut out = BufWriter::new(File::create(path).map_err(output)?);
        self.write_to(&mut out).map_err(output)?;
        out.flush().map_err(output)?;
        tracing::info!(path = %path.display(), "wrote inverted index");
        Ok(())
    }

    /// Copies the current contents out from under the lock.
    pub fn snapshot(&self) -> InvertedIndex { self.inner.read().clone() }

    pub fn into_inner(self) -> InvertedIndex { self.inner.into_inner() }
}
