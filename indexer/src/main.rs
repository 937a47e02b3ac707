use anyhow::{bail, Result};
use clap::Parser;
use pindex_core::stats::{write_summary, BuildSummary};
use pindex_core::{ConcurrentIndex, IndexBuilder, QueryParser, SearchMode, WorkQueue};
use pindex_crawler::{FetcherConfig, HttpFetcher, WebCrawler, DEFAULT_MAX_PAGES};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pindex")]
#[command(about = "Build an inverted index from files or a web crawl and answer prefix queries")]
struct Cli {
    /// Directory (or single file) to index
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,
    /// Only index files whose name ends with this suffix (case-insensitive)
    #[arg(long, default_value = ".txt")]
    suffix: String,
    /// Seed URL to crawl from
    #[arg(short = 'u', long = "url")]
    url: Option<String>,
    /// Maximum number of pages to crawl
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: usize,
    /// File of queries, one per line
    #[arg(short = 'q', long = "query")]
    query: Option<PathBuf>,
    /// Match query words exactly instead of as prefixes
    #[arg(long, default_value_t = false)]
    exact: bool,
    /// Write the inverted index to this file
    #[arg(short = 'i', long = "index", num_args = 0..=1, default_missing_value = "invertedindex.txt")]
    index: Option<PathBuf>,
    /// Write search results to this file
    #[arg(short = 'r', long = "results", num_args = 0..=1, default_missing_value = "searchresults.txt")]
    results: Option<PathBuf>,
    /// Also write search results as JSON
    #[arg(long)]
    json_results: Option<PathBuf>,
    /// Write a JSON summary of the build
    #[arg(long)]
    stats: Option<PathBuf>,
    /// Worker threads
    #[arg(short = 't', long = "threads", default_value_t = 5)]
    threads: usize,
    /// User-Agent sent while crawling
    #[arg(long)]
    user_agent: Option<String>,
    /// Per-request timeout while crawling; no timeout when unset
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    if cli.dir.is_none() && cli.url.is_none() && cli.query.is_none() {
        bail!("nothing to do: pass --dir, --url or --query");
    }
    let threads = if cli.threads == 0 {
        tracing::warn!("--threads must be positive, using 5");
        5
    } else {
        cli.threads
    };

    let started = Instant::now();
    let pool = WorkQueue::new(threads)?;
    let index = Arc::new(ConcurrentIndex::new());
    let mut failures = 0usize;

    if let Some(seed) = &cli.url {
        let mut config = FetcherConfig::default();
        if let Some(ua) = &cli.user_agent {
            config.user_agent = ua.clone();
        }
        config.timeout = cli.timeout_secs.map(Duration::from_secs);
        let crawler = WebCrawler::new(pool.executor(), Arc::new(HttpFetcher::new(&config)?), cli.max_pages);
        match crawler.crawl(seed, &index) {
            Ok(pages) => tracing::info!(pages, "crawl complete"),
            Err(err) => {
                tracing::error!(error = %err, "crawl skipped");
                failures += 1;
            }
        }
    }

    if let Some(dir) = &cli.dir {
        match IndexBuilder::new(pool.executor()).build(dir, &cli.suffix, &index) {
            Ok(files) => tracing::info!(files, "directory indexed"),
            Err(err) => {
                tracing::error!(error = %err, "directory skipped");
                failures += 1;
            }
        }
    }

    let stats = index.stats();
    tracing::info!(words = stats.words, documents = stats.documents, positions = stats.positions, "index built");

    if let Some(path) = &cli.index {
        if let Err(err) = index.write_file(path) {
            tracing::error!(error = %err, "index not written");
            failures += 1;
        }
    }

    if let Some(query) = &cli.query {
        let mode = if cli.exact { SearchMode::Exact } else { SearchMode::Partial };
        let parser = QueryParser::new(pool.executor());
        let answered = match parser.parse_file(query, &index, mode) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(error = %err, "query file not fully read");
                failures += 1;
                // a partial read still writes whatever was answered
                !parser.results().is_empty()
            }
        };
        if answered {
            if let Some(path) = &cli.results {
                if let Err(err) = parser.write_file(path) {
                    tracing::error!(error = %err, "results not written");
                    failures += 1;
                }
            }
            if let Some(path) = &cli.json_results {
                if let Err(err) = parser.write_json(path) {
                    tracing::error!(error = %err, "json results not written");
                    failures += 1;
                }
            }
        }
    }

    if let Some(path) = &cli.stats {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Err(err) = write_summary(path, &BuildSummary::new(stats, pool.threads(), elapsed_ms)) {
            tracing::error!(error = %err, "summary not written");
            failures += 1;
        }
    }

    pool.shutdown();
    if failures > 0 {
        bail!("{failures} step(s) failed, see log");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_flags_take_optional_values() {
        let cli = Cli::try_parse_from(["pindex", "-d", "corpus", "-i", "-r", "out.txt", "-q", "q.txt"]).unwrap();
        assert_eq!(cli.index, Some(PathBuf::from("invertedindex.txt")));
        assert_eq!(cli.results, Some(PathBuf::from("out.txt")));
        assert_eq!(cli.threads, 5);
        assert_eq!(cli.suffix, ".txt");
        assert!(!cli.exact);
    }

    #[test]
    fn output_flags_default_to_absent() {
        let cli = Cli::try_parse_from(["pindex", "-u", "http://example.com/", "-t", "8"]).unwrap();
        assert!(cli.index.is_none());
        assert!(cli.results.is_none());
        assert_eq!(cli.threads, 8);
        assert_eq!(cli.max_pages, DEFAULT_MAX_PAGES);
    }
}
