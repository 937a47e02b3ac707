//! Web crawling front end for the index: fetches pages, follows anchor links
//! up to a page budget, and merges each page's text into a shared index.

pub mod crawl;
pub mod fetch;
pub mod links;

pub use crawl::{CrawlError, WebCrawler, DEFAULT_MAX_PAGES};
pub use fetch::{FetchError, FetchedPage, Fetcher, FetcherConfig, HttpFetcher};
