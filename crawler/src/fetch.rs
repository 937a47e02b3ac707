use reqwest::blocking::Client;
use reqwest::header;
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("unable to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A fetched response reduced to header text and body text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub headers: String,
    pub body: String,
}

impl FetchedPage {
    pub fn new(headers: impl Into<String>, body: impl Into<String>) -> Self {
        Self { headers: headers.into(), body: body.into() }
    }

    /// Value of the first `Content-Type` header line, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim().eq_ignore_ascii_case("content-type").then(|| value.trim())
        })
    }

    pub fn is_html(&self) -> bool {
        self.content_type().is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Source of pages for the crawler.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    /// `None` waits as long as the server keeps the connection open.
    pub timeout: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self { user_agent: format!("pindex/{}", env!("CARGO_PKG_VERSION")), timeout: None }
    }
}

/// Blocking HTTP fetcher; runs on the calling worker thread.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "text/html,*/*;q=0.8")
            .send()
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let mut headers = format!("{:?} {}\r\n", resp.version(), status);
        for (name, value) in resp.headers() {
            let _ = write!(headers, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
        }
        let bytes = resp.bytes().map_err(|source| FetchError::Body { url: url.to_string(), source })?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        Ok(FetchedPage { headers, body })
    }
}
