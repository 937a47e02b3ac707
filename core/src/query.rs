use crate::error::IndexError;
use crate::index::ConcurrentIndex;
use crate::lock::ReadWriteLock;
use crate::pool::Executor;
use crate::search::SearchResult;
use crate::tokenizer::parse_words;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Partial,
    Exact,
}

type Slot = (String, Option<Vec<SearchResult>>);

#[derive(Serialize)]
struct QueryRecord<'a> {
    query: &'a str,
    results: &'a [SearchResult],
}

/// Runs one search task per query line and keeps the answers in file order.
///
/// Each line reserves its slot before its task is submitted, so tasks may
/// finish in any order. Repeated lines get their own slots.
pub struct QueryParser {
    executor: Executor,
    slots: Arc<ReadWriteLock<Vec<Slot>>>,
}

impl QueryParser {
    pub fn new(executor: Executor) -> Self {
        Self { executor, slots: Arc::new(ReadWriteLock::new(Vec::new())) }
    }

    /// Searches every line of `path` against `index` and waits for the answers.
    /// Lines that are not valid UTF-8 are logged and skipped. Returns the
    /// number of queries submitted.
    ///
    /// Queries submitted before a read error are still answered before the
    /// error is returned.
    pub fn parse_file(&self, path: &Path, index: &Arc<ConcurrentIndex>, mode: SearchMode) -> Result<usize, IndexError> {
        let file = File::open(path).map_err(|e| IndexError::from_read(path, e))?;
        let mut count = 0;
        let mut failed = None;
        for (number, line) in BufReader::new(file).lines().enumerate() {
            match line {
                Ok(line) => {
                    self.submit_line(line, index, mode);
                    count += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    tracing::warn!(path = %path.display(), line = number + 1, error = %err, "skipping malformed query line");
                }
                Err(err) => {
                    failed = Some(IndexError::from_read(path, err));
                    break;
                }
            }
        }
        self.executor.await_idle();
        if let Some(err) = failed {
            return Err(err);
        }
        tracing::info!(path = %path.display(), queries = count, "queries answered");
        Ok(count)
    }

    /// Reserves the next slot for `line` and submits its search.
    pub fn submit_line(&self, line: String, index: &Arc<ConcurrentIndex>, mode: SearchMode) {
        let words = parse_words(&line);
        let slot = {
            let mut slots = self.slots.write();
            slots.push((line, None));
            slots.len() - 1
        };
        let slots = self.slots.clone();
        let index = index.clone();
        self.executor.submit(move || {
            let results = match mode {
                SearchMode::Partial => index.partial_search(&words),
                SearchMode::Exact => index.exact_search(&words),
            };
            slots.write()[slot].1 = Some(results);
            Ok(())
        });
    }

    /// Query lines with their ranked results, in submission order. Lines whose
    /// search has not finished show up with no results.
    pub fn results(&self) -> Vec<(String, Vec<SearchResult>)> {
        self.slots.read().iter().map(|(query, results)| (query.clone(), results.clone().unwrap_or_default())).collect()
    }

    pub fn reset(&self) {
        self.executor.await_idle();
        self.slots.write().clear();
    }

    /// Each query line, then one `"location", frequency, position` line per
    /// result, then a blank line. One more blank line ends the output.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let slots = self.slots.read();
        for (query, results) in slots.iter() {
            writeln!(out, "{query}")?;
            for result in results.iter().flatten() {
                writeln!(out, "{result}")?;
            }
            writeln!(out)?;
        }
        writeln!(out)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), IndexError> {
        let output = |source| IndexError::Output { path: path.to_path_buf(), source };
        let mut out = BufWriter::new(File::create(path).map_err(output)?);
        self.write_to(&mut out).map_err(output)?;
        out.flush().map_err(output)?;
        tracing::info!(path = %path.display(), "wrote search results");
        Ok(())
    }

    pub fn write_json(&self, path: &Path) -> Result<(), IndexError> {
        let output = |source| IndexError::Output { path: path.to_path_buf(), source };
        let slots = self.slots.read();
        let records: Vec<QueryRecord<'_>> = slots
            .iter()
            .map(|(query, results)| QueryRecord { query, results: results.as_deref().unwrap_or_default() })
            .collect();
        let mut out = BufWriter::new(File::create(path).map_err(output)?);
        serde_json::to_writer_pretty(&mut out, &records).map_err(|e| output(e.into()))?;
        out.flush().map_err(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InvertedIndex;
    use crate::pool::WorkQueue;

    fn sample_index() -> Arc<ConcurrentIndex> {
        let index = ConcurrentIndex::new();
        let mut local = InvertedIndex::new();
        local.add_words("a.txt", &parse_words("cat dog cat"), 1);
        local.add_words("b.txt", &parse_words("dogma catalog"), 1);
        index.merge(local);
        Arc::new(index)
    }

    #[test]
    fn keeps_line_order_and_duplicates() {
        let pool = WorkQueue::new(4).unwrap();
        let index = sample_index();
        let parser = QueryParser::new(pool.executor());
        for line in ["cat", "dog", "cat"] {
            parser.submit_line(line.to_owned(), &index, SearchMode::Partial);
        }
        pool.await_idle();

        let results = parser.results();
        let queries: Vec<&str> = results.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["cat", "dog", "cat"]);
        assert_eq!(results[0].1, vec![SearchResult::new("a.txt", 2, 1), SearchResult::new("b.txt", 1, 2)]);
        assert_eq!(results[0].1, results[2].1);
    }

    #[test]
    fn empty_line_is_recorded_with_no_results() {
        let pool = WorkQueue::new(2).unwrap();
        let parser = QueryParser::new(pool.executor());
        parser.submit_line(String::new(), &sample_index(), SearchMode::Partial);
        pool.await_idle();
        assert_eq!(parser.results(), vec![(String::new(), vec![])]);

        let mut out = Vec::new();
        parser.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n\n\n");
    }

    #[test]
    fn exact_mode_skips_extensions() {
        let pool = WorkQueue::new(2).unwrap();
        let parser = QueryParser::new(pool.executor());
        parser.submit_line("Cat!".to_owned(), &sample_index(), SearchMode::Exact);
        pool.await_idle();
        assert_eq!(parser.results()[0].1, vec![SearchResult::new("a.txt", 2, 1)]);
    }

    #[test]
    fn malformed_query_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        std::fs::write(&path, b"cat\n\xff\xfe\ndog\n").unwrap();

        let pool = WorkQueue::new(2).unwrap();
        let parser = QueryParser::new(pool.executor());
        assert_eq!(parser.parse_file(&path, &sample_index(), SearchMode::Partial).unwrap(), 2);

        let results = parser.results();
        let queries: Vec<&str> = results.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["cat", "dog"]);
        assert_eq!(results[1].1, vec![SearchResult::new("b.txt", 1, 1), SearchResult::new("a.txt", 1, 2)]);
    }

    #[test]
    fn renders_results_format() {
        let pool = WorkQueue::new(2).unwrap();
        let parser = QueryParser::new(pool.executor());
        parser.submit_line("dog".to_owned(), &sample_index(), SearchMode::Partial);
        pool.await_idle();
        let mut out = Vec::new();
        parser.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "dog\n\"b.txt\", 1, 1\n\"a.txt\", 1, 2\n\n\n");
    }
}
