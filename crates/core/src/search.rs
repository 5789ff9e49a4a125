use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;

use crate::error::{Result, ScriptcastError};

pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
pub const MAX_SEARCH_RESULTS: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) scriptcast/0.1";

static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SafeSearch {
    Strict,
    Moderate,
    Off,
}

impl SafeSearch {
    fn as_param(&self) -> &'static str {
        match self {
            SafeSearch::Strict => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
    Month,
    Year,
}

impl TimeWindow {
    fn as_param(&self) -> &'static str {
        match self {
            TimeWindow::Day => "d",
            TimeWindow::Week => "w",
            TimeWindow::Month => "m",
            TimeWindow::Year => "y",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: String,
    pub region: String,
    pub safesearch: SafeSearch,
    pub time_window: TimeWindow,
    pub max_results: usize,
}

impl SearchQuery {
    /// US-English, unfiltered, recent content, top five hits.
    pub fn recent(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            region: "us-en".to_string(),
            safesearch: SafeSearch::Off,
            time_window: TimeWindow::Month,
            max_results: MAX_SEARCH_RESULTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub body: String,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Hits in the engine's ranking order, at most `query.max_results`.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}

pub struct DuckDuckGo {
    client: reqwest::Client,
    url: String,
}

impl DuckDuckGo {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_url(DUCKDUCKGO_HTML_URL, timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGo {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let failed = |reason: String| ScriptcastError::SearchFailed {
            query: query.keywords.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query.keywords.as_str()),
                ("kl", query.region.as_str()),
                ("kp", query.safesearch.as_param()),
                ("df", query.time_window.as_param()),
            ])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let html = response.text().await.map_err(|e| failed(e.to_string()))?;
        let hits = parse_result_snippets(&html, query.max_results);
        tracing::debug!(query = %query.keywords, hits = hits.len(), "search finished");
        Ok(hits)
    }
}

/// Pulls result snippets out of a DuckDuckGo HTML results page.
pub fn parse_result_snippets(html: &str, max_results: usize) -> Vec<SearchHit> {
    SNIPPET_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let stripped = TAG_RE.replace_all(&caps[1], "");
            let decoded = decode_entities(&stripped);
            let body = SPACE_RE.replace_all(decoded.trim(), " ").into_owned();
            (!body.is_empty()).then_some(SearchHit { body })
        })
        .take(max_results)
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
