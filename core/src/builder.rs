use crate::error::IndexError;
use crate::index::{ConcurrentIndex, InvertedIndex};
use crate::lock::ReadWriteLock;
use crate::pool::Executor;
use crate::tokenizer::parse_words;
use anyhow::Result;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Builds an index from a directory tree.
///
/// Every directory is listed by its own task, so traversal fans out across
/// the pool. Matching files are parsed by one task each into a local index
/// that is merged into the shared index exactly once.
pub struct IndexBuilder {
    executor: Executor,
    paths: Arc<ReadWriteLock<BTreeSet<PathBuf>>>,
}

impl IndexBuilder {
    pub fn new(executor: Executor) -> Self {
        Self { executor, paths: Arc::new(ReadWriteLock::new(BTreeSet::new())) }
    }

    /// Collects every file below `root` whose name ends with `suffix`
    /// (ASCII case-insensitive). Blocks until traversal converges. Paths
    /// found by earlier calls are forgotten first.
    pub fn traverse(&self, root: &Path, suffix: &str) -> Result<Vec<PathBuf>, IndexError> {
        self.reset();
        let metadata = std::fs::metadata(root).map_err(|e| IndexError::from_read(root, e))?;
        if metadata.is_dir() {
            tracing::debug!(root = %root.display(), "starting traversal");
            submit_directory(self.executor.clone(), self.paths.clone(), root.to_path_buf(), suffix.to_owned());
            self.executor.await_idle();
        } else if has_suffix(root, suffix) {
            self.paths.write().insert(root.to_path_buf());
        }
        Ok(self.paths())
    }

    /// Traverses `root` and indexes every matching file into `index`.
    /// Returns how many files were handed to parse tasks.
    pub fn build(&self, root: &Path, suffix: &str, index: &Arc<ConcurrentIndex>) -> Result<usize, IndexError> {
        let files = self.traverse(root, suffix)?;
        tracing::info!(root = %root.display(), files = files.len(), "parsing files");
        for file in &files {
            let file = file.clone();
            let index = index.clone();
            self.executor.submit(move || {
                let local = parse_file(&file)?;
                index.merge(local);
                tracing::debug!(file = %file.display(), "merged");
                Ok(())
            });
        }
        self.executor.await_idle();
        Ok(files.len())
    }

    /// Sorted snapshot of the paths discovered so far.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.read().iter().cloned().collect()
    }

    pub fn reset(&self) {
        self.executor.await_idle();
        self.paths.write().clear();
    }
}

fn submit_directory(executor: Executor, paths: Arc<ReadWriteLock<BTreeSet<PathBuf>>>, dir: PathBuf, suffix: String) {
    let ex = executor.clone();
    executor.submit(move || {
        let mut found = BTreeSet::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_dir() {
                submit_directory(ex.clone(), paths.clone(), path.to_path_buf(), suffix.clone());
            } else if path.is_file() && has_suffix(path, &suffix) {
                found.insert(path.to_path_buf());
            }
        }
        if !found.is_empty() {
            paths.write().extend(found);
        }
        tracing::debug!(dir = %dir.display(), "directory listed");
        Ok(())
    });
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    let name = path.to_string_lossy();
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Reads `path` line by line into a fresh index keyed by the path's display
/// form. Positions start at 1 and continue across lines.
pub fn parse_file(path: &Path) -> Result<InvertedIndex, IndexError> {
    let file = File::open(path).map_err(|e| IndexError::from_read(path, e))?;
    let document = path.display().to_string();
    let mut index = InvertedIndex::new();
    let mut position = 1;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| IndexError::from_read(path, e))?;
        position = index.add_words(&document, &parse_words(&line), position);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkQueue;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn suffix_is_case_insensitive() {
        assert!(has_suffix(Path::new("a/b/NOTES.TXT"), ".txt"));
        assert!(!has_suffix(Path::new("a/b/notes.md"), ".txt"));
        assert!(!has_suffix(Path::new("x"), ".txt"));
    }

    #[test]
    fn positions_continue_across_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "Cat cat\n\n  dog, CAT!\n").unwrap();
        let index = parse_file(&path).unwrap();
        let doc = path.display().to_string();
        assert_eq!(index.positions("cat", &doc), Some(&[1, 2, 4][..]));
        assert_eq!(index.positions("dog", &doc), Some(&[3][..]));
    }

    #[test]
    fn missing_and_binary_files_are_classified() {
        let dir = tempdir().unwrap();
        assert!(matches!(parse_file(&dir.path().join("nope.txt")), Err(IndexError::NotFound(_))));

        let binary = dir.path().join("bin.txt");
        fs::write(&binary, [0x66u8, 0x6f, 0xff, 0xfe, 0x0a]).unwrap();
        assert!(matches!(parse_file(&binary), Err(IndexError::Malformed { .. })));
    }

    #[test]
    fn traverses_nested_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.txt"), "one").unwrap();
        fs::write(root.join("a/mid.TXT"), "two").unwrap();
        fs::write(root.join("a/b/c/deep.txt"), "three").unwrap();
        fs::write(root.join("a/b/skip.md"), "four").unwrap();

        let pool = WorkQueue::new(3).unwrap();
        let builder = IndexBuilder::new(pool.executor());
        let files = builder.traverse(root, ".txt").unwrap();
        let expected: Vec<PathBuf> =
            vec![root.join("a/b/c/deep.txt"), root.join("a/mid.TXT"), root.join("top.txt")];
        assert_eq!(files, expected);

        builder.reset();
        assert!(builder.paths().is_empty());
    }

    #[test]
    fn single_file_root_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("only.txt");
        fs::write(&path, "hello there").unwrap();

        let pool = WorkQueue::new(2).unwrap();
        let index = Arc::new(ConcurrentIndex::new());
        let count = IndexBuilder::new(pool.executor()).build(&path, ".txt", &index).unwrap();
        assert_eq!(count, 1);
        assert!(index.contains("hello"));
    }

    #[test]
    fn rebuilding_only_parses_the_new_root() {
        let dir = tempdir().unwrap();
        let (first, second) = (dir.path().join("first"), dir.path().join("second"));
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("a.txt"), "apple pie").unwrap();
        fs::write(second.join("b.txt"), "apple tart").unwrap();

        let pool = WorkQueue::new(2).unwrap();
        let builder = IndexBuilder::new(pool.executor());
        let index = Arc::new(ConcurrentIndex::new());
        assert_eq!(builder.build(&first, ".txt", &index).unwrap(), 1);
        assert_eq!(builder.build(&second, ".txt", &index).unwrap(), 1);
        assert_eq!(builder.paths(), vec![second.join("b.txt")]);

        let local = Arc::try_unwrap(index).unwrap().into_inner();
        let a = first.join("a.txt").display().to_string();
        let b = second.join("b.txt").display().to_string();
        assert_eq!(local.positions("apple", &a), Some(&[1][..]));
        assert_eq!(local.positions("apple", &b), Some(&[1][..]));
    }

    #[test]
    fn missing_root_is_not_found() {
        let pool = WorkQueue::new(1).unwrap();
        let builder = IndexBuilder::new(pool.executor());
        let err = builder.traverse(Path::new("/definitely/not/here"), ".txt").unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }
}
