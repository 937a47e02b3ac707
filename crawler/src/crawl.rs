use crate::fetch::Fetcher;
use crate::links::{canonicalize, extract_links};
use pindex_core::html::html_words;
use pindex_core::{ConcurrentIndex, Executor, InvertedIndex, ReadWriteLock};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 50;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed url {seed:?}: {source}")]
    Seed {
        seed: String,
        #[source]
        source: url::ParseError,
    },
    #[error("seed url {0} is not http or https")]
    Scheme(String),
}

/// Breadth-limited crawler that indexes every page it visits.
///
/// The visited set doubles as the page budget: a link is only followed while
/// fewer than `max_pages` URLs have been admitted, and the check and insert
/// for all links of one page happen under a single write guard.
pub struct WebCrawler {
    shared: Arc<Shared>,
}

struct Shared {
    executor: Executor,
    fetcher: Arc<dyn Fetcher>,
    visited: ReadWriteLock<HashSet<String>>,
    max_pages: usize,
}

impl WebCrawler {
    pub fn new(executor: Executor, fetcher: Arc<dyn Fetcher>, max_pages: usize) -> Self {
        let shared = Shared { executor, fetcher, visited: ReadWriteLock::new(HashSet::new()), max_pages: max_pages.max(1) };
        Self { shared: Arc::new(shared) }
    }

    /// Crawls outward from `seed`, merging each page into `index`, and blocks
    /// until no crawl task is left. Returns the number of pages admitted.
    pub fn crawl(&self, seed: &str, index: &Arc<ConcurrentIndex>) -> Result<usize, CrawlError> {
        let parsed = Url::parse(seed.trim()).map_err(|source| CrawlError::Seed { seed: seed.to_owned(), source })?;
        let url = canonicalize(&parsed, parsed.as_str()).ok_or_else(|| CrawlError::Scheme(seed.to_owned()))?;

        let admitted = self.shared.visited.write().insert(url.to_string());
        if admitted {
            tracing::info!(seed = %url, max_pages = self.shared.max_pages, "starting crawl");
            submit_page(self.shared.clone(), url, index.clone());
        }
        self.shared.executor.await_idle();

        let visited = self.shared.visited.read().len();
        tracing::info!(visited, "crawl finished");
        Ok(visited)
    }

    /// Sorted snapshot of the admitted URLs.
    pub fn visited(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.shared.visited.read().iter().cloned().collect();
        urls.sort();
        urls
    }

    pub fn max_pages(&self) -> usize { self.shared.max_pages }

    pub fn reset(&self) {
        self.shared.executor.await_idle();
        self.shared.visited.write().clear();
    }
}

fn submit_page(shared: Arc<Shared>, url: Url, index: Arc<ConcurrentIndex>) {
    let executor = shared.executor.clone();
    executor.submit(move || {
        let page = shared.fetcher.fetch(&url)?;

        if page.is_html() {
            let links = extract_links(&page.body);
            let mut visited = shared.visited.write();
            for href in &links {
                if visited.len() >= shared.max_pages {
                    break;
                }
                let Some(link) = canonicalize(&url, href) else { continue };
                if visited.insert(link.to_string()) {
                    submit_page(shared.clone(), link, index.clone());
                }
            }
            tracing::debug!(url = %url, links = links.len(), visited = visited.len(), "links followed");
        } else {
            tracing::debug!(url = %url, content_type = ?page.content_type(), "not html, links ignored");
        }

        let document = url.to_string();
        let mut local = InvertedIndex::new();
        local.add_words(&document, &html_words(&page.body), 1);
        index.merge(local);
        Ok(())
    });
}
