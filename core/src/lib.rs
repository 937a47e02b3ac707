//! Concurrent inverted-index construction and ranked prefix search.
//!
//! Documents are discovered by [`IndexBuilder`] (filesystem) or by the
//! crawler crate, parsed by tasks on a [`WorkQueue`] into local
//! [`InvertedIndex`]es, and merged into one shared [`ConcurrentIndex`].
//! [`QueryParser`] then answers query files against it.

pub mod builder;
pub mod error;
pub mod html;
pub mod index;
pub mod lock;
pub mod pool;
pub mod query;
pub mod search;
pub mod stats;
pub mod tokenizer;

pub use builder::IndexBuilder;
pub use error::IndexError;
pub use index::{ConcurrentIndex, InvertedIndex, Postings};
pub use lock::{RawReadWriteLock, ReadWriteLock};
pub use pool::{Executor, Pending, WorkQueue};
pub use query::{QueryParser, SearchMode};
pub use search::SearchResult;
pub use stats::{BuildSummary, IndexStats};
