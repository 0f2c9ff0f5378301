//! Evidence Gatherer - External lookups that back a debate statement
//!
//! Three independent sources are consulted for a search term:
//!
//! - **Knowledge engine** (Wolfram|Alpha): short factual pods
//! - **Encyclopedia** (Wikipedia): a two-sentence page summary
//! - **News search** (NewsAPI): the most relevant recent articles
//!
//! Each lookup returns its own `Result`. Failures are never propagated out of
//! the gatherer; they stay inspectable in an [`EvidenceReport`] and turn into
//! fallback text only when the report is rendered into an [`EvidenceBundle`].

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use statement_oracle::Query;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const WOLFRAM_BASE_URL: &str = "https://api.wolframalpha.com";
pub const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org";
pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org";

/// Rendered when the knowledge engine cannot answer a fact-check query
pub const FACT_CHECK_FALLBACK: &str = "Wolfram Alpha could not verify this statement.";

/// Rendered when a statement produced no query
pub const OPINION_NOTICE: &str =
    "This statement is an opinion or subjective claim and cannot be fact-checked.";

const USER_AGENT: &str = concat!("debate-assistant/", env!("CARGO_PKG_VERSION"));

// ============ Errors ============

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{0}")]
    Api(String),
    #[error("No results for \"{0}\"")]
    NoResults(String),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

// ============ Source Types ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncyclopediaEntry {
    pub title: String,
    pub summary: String,
    pub url: String,
}

impl EncyclopediaEntry {
    pub fn render(&self) -> String {
        format!("{}\n{}\nRead more: {}", self.title, self.summary, self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

impl NewsArticle {
    pub fn render(&self) -> String {
        match &self.description {
            Some(description) => format!(
                "{}\n{}\nRead more: {}",
                self.title, description, self.url
            ),
            None => format!("{}\nRead more: {}", self.title, self.url),
        }
    }
}

/// Computational knowledge engine
pub trait KnowledgeEngine {
    /// Text of every pod returned for the query
    fn pods(&self, query: &str) -> Result<Vec<String>, EvidenceError>;

    /// Text of the primary result pod
    fn primary_answer(&self, query: &str) -> Result<String, EvidenceError>;
}

pub trait Encyclopedia {
    fn summary(&self, title: &str) -> Result<EncyclopediaEntry, EvidenceError>;
}

pub trait NewsSearch {
    fn search(&self, query: &str) -> Result<Vec<NewsArticle>, EvidenceError>;
}

// ============ Configuration ============

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub wolfram_app_id: Option<String>,
    pub news_api_key: Option<String>,
    pub timeout: Duration,
    pub wolfram_base_url: String,
    pub wikipedia_base_url: String,
    pub news_base_url: String,
    /// Sentences kept from an encyclopedia summary
    pub summary_sentences: usize,
    pub news_page_size: u8,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            wolfram_app_id: None,
            news_api_key: None,
            timeout: Duration::from_secs(10),
            wolfram_base_url: WOLFRAM_BASE_URL.to_string(),
            wikipedia_base_url: WIKIPEDIA_BASE_URL.to_string(),
            news_base_url: NEWSAPI_BASE_URL.to_string(),
            summary_sentences: 2,
            news_page_size: 3,
        }
    }
}

fn http_client(timeout: Duration) -> Result<Client, EvidenceError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

// ============ Wolfram|Alpha ============

pub struct WolframAlphaClient {
    http: Client,
    base_url: String,
    app_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WolframEnvelope {
    queryresult: WolframResult,
}

#[derive(Debug, Deserialize)]
struct WolframResult {
    #[serde(default)]
    success: bool,
    /// `false` on success, an object with `msg` on failure
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    pods: Vec<WolframPod>,
}

#[derive(Debug, Deserialize)]
struct WolframPod {
    #[serde(default)]
    title: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    subpods: Vec<WolframSubpod>,
}

#[derive(Debug, Deserialize)]
struct WolframSubpod {
    #[serde(default)]
    plaintext: Option<String>,
}

impl WolframPod {
    fn text(&self) -> Option<&str> {
        self.subpods
            .first()
            .and_then(|s| s.plaintext.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    fn is_result(&self) -> bool {
        self.primary || self.title == "Result"
    }
}

impl WolframResult {
    fn pod_texts(&self) -> Vec<String> {
        self.pods
            .iter()
            .filter_map(WolframPod::text)
            .map(str::to_string)
            .collect()
    }

    fn primary_text(&self) -> Option<String> {
        self.pods
            .iter()
            .filter(|p| p.is_result())
            .find_map(WolframPod::text)
            .map(str::to_string)
    }
}

fn parse_wolfram(body: &str, input: &str) -> Result<WolframResult, EvidenceError> {
    let envelope: WolframEnvelope = serde_json::from_str(body)?;
    let result = envelope.queryresult;

    if let Some(msg) = result.error.get("msg").and_then(|m| m.as_str()) {
        return Err(EvidenceError::Api(format!("Wolfram Alpha error: {}", msg)));
    }
    if !result.success {
        return Err(EvidenceError::NoResults(input.to_string()));
    }
    Ok(result)
}

impl WolframAlphaClient {
    pub fn new(config: &SourceConfig) -> Result<Self, EvidenceError> {
        Ok(Self {
            http: http_client(config.timeout)?,
            base_url: config.wolfram_base_url.trim_end_matches('/').to_string(),
            app_id: config.wolfram_app_id.clone(),
        })
    }

    fn query(&self, input: &str) -> Result<WolframResult, EvidenceError> {
        let app_id = self
            .app_id
            .as_deref()
            .ok_or(EvidenceError::MissingCredentials("Wolfram Alpha"))?;

        debug!(query = input, "query sent to Wolfram Alpha");
        let response = self
            .http
            .get(format!("{}/v2/query", self.base_url))
            .query(&[
                ("appid", app_id),
                ("input", input),
                ("output", "json"),
                ("format", "plaintext"),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvidenceError::Status {
                service: "Wolfram Alpha",
                status: status.as_u16(),
            });
        }
        parse_wolfram(&response.text()?, input)
    }
}

impl KnowledgeEngine for WolframAlphaClient {
    fn pods(&self, query: &str) -> Result<Vec<String>, EvidenceError> {
        let texts = self.query(query)?.pod_texts();
        if texts.is_empty() {
            return Err(EvidenceError::NoResults(query.to_string()));
        }
        Ok(texts)
    }

    fn primary_answer(&self, query: &str) -> Result<String, EvidenceError> {
        self.query(query)?
            .primary_text()
            .ok_or_else(|| EvidenceError::NoResults(query.to_string()))
    }
}

// ============ Wikipedia ============

pub struct WikipediaClient {
    http: Client,
    base_url: String,
    sentences: usize,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

fn parse_summary(body: &str, sentences: usize) -> Result<EncyclopediaEntry, EvidenceError> {
    let page: PageSummary = serde_json::from_str(body)?;

    if page.kind == "disambiguation" {
        return Err(EvidenceError::Api(format!(
            "\"{}\" may refer to several pages",
            page.title
        )));
    }
    if page.extract.trim().is_empty() {
        return Err(EvidenceError::NoResults(page.title));
    }

    Ok(EncyclopediaEntry {
        summary: first_sentences(&page.extract, sentences),
        url: page
            .content_urls
            .map(|u| u.desktop.page)
            .unwrap_or_default(),
        title: page.title,
    })
}

/// Keep the first `count` sentences; `0` keeps the whole text
fn first_sentences(text: &str, count: usize) -> String {
    let text = text.trim();
    if count == 0 {
        return text.to_string();
    }

    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                seen += 1;
                if seen == count {
                    return text[..i + c.len_utf8()].to_string();
                }
            }
        }
    }
    text.to_string()
}

impl WikipediaClient {
    pub fn new(config: &SourceConfig) -> Result<Self, EvidenceError> {
        Ok(Self {
            http: http_client(config.timeout)?,
            base_url: config.wikipedia_base_url.trim_end_matches('/').to_string(),
            sentences: config.summary_sentences,
        })
    }

    fn summary_url(&self, title: &str) -> Result<Url, EvidenceError> {
        let mut url = Url::parse(&format!("{}/api/rest_v1/page/summary", self.base_url))
            .map_err(|e| EvidenceError::Api(format!("invalid Wikipedia base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| EvidenceError::Api("invalid Wikipedia base URL".to_string()))?
            .push(&title.trim().replace(' ', "_"));
        Ok(url)
    }
}

impl Encyclopedia for WikipediaClient {
    fn summary(&self, title: &str) -> Result<EncyclopediaEntry, EvidenceError> {
        let url = self.summary_url(title)?;
        debug!(%url, "requesting Wikipedia summary");

        let response = self.http.get(url).send()?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(EvidenceError::NoResults(title.to_string()));
        }
        if !status.is_success() {
            return Err(EvidenceError::Status {
                service: "Wikipedia",
                status: status.as_u16(),
            });
        }
        parse_summary(&response.text()?, self.sentences)
    }
}

// ============ NewsAPI ============

pub struct NewsApiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u8,
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

fn parse_news(body: &str) -> Result<Vec<NewsArticle>, EvidenceError> {
    let envelope: NewsEnvelope = serde_json::from_str(body)?;

    if envelope.status != "ok" {
        return Err(EvidenceError::Api(
            envelope
                .message
                .unwrap_or_else(|| format!("NewsAPI status {}", envelope.status)),
        ));
    }

    Ok(envelope
        .articles
        .into_iter()
        .map(|a| NewsArticle {
            title: a.title.unwrap_or_else(|| "Untitled".to_string()),
            description: a.description.filter(|d| !d.trim().is_empty()),
            url: a.url.unwrap_or_default(),
        })
        .collect())
}

impl NewsApiClient {
    pub fn new(config: &SourceConfig) -> Result<Self, EvidenceError> {
        Ok(Self {
            http: http_client(config.timeout)?,
            base_url: config.news_base_url.trim_end_matches('/').to_string(),
            api_key: config.news_api_key.clone(),
            page_size: config.news_page_size,
        })
    }
}

impl NewsSearch for NewsApiClient {
    fn search(&self, query: &str) -> Result<Vec<NewsArticle>, EvidenceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(EvidenceError::MissingCredentials("NewsAPI"))?;

        debug!(query, "searching NewsAPI");
        let page_size = self.page_size.to_string();
        let response = self
            .http
            .get(format!("{}/v2/everything", self.base_url))
            .query(&[
                ("q", query),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        // NewsAPI reports its own errors in the body, prefer that message
        match parse_news(&body) {
            Err(EvidenceError::Decode(_)) if !status.is_success() => Err(EvidenceError::Status {
                service: "NewsAPI",
                status: status.as_u16(),
            }),
            other => other,
        }
    }
}

// ============ Gathering ============

/// Raw outcome of one gathering pass, one `Result` per source
#[derive(Debug)]
pub struct EvidenceReport {
    pub term: String,
    pub summary: Result<EncyclopediaEntry, EvidenceError>,
    pub facts: Result<Vec<String>, EvidenceError>,
    pub articles: Result<Vec<NewsArticle>, EvidenceError>,
}

impl EvidenceReport {
    /// Names of the sources that failed
    pub fn degraded_sources(&self) -> Vec<&'static str> {
        let mut degraded = Vec::new();
        if self.summary.is_err() {
            degraded.push("encyclopedia");
        }
        if self.facts.is_err() {
            degraded.push("knowledge_engine");
        }
        if self.articles.is_err() {
            degraded.push("news");
        }
        degraded
    }

    pub fn is_complete(&self) -> bool {
        self.degraded_sources().is_empty()
    }

    /// Render every source, replacing failures with fallback text
    pub fn bundle(&self) -> EvidenceBundle {
        let summary = match &self.summary {
            Ok(entry) => entry.render(),
            Err(e) => format!("No Wikipedia page found: {}", e),
        };
        let facts = match &self.facts {
            Ok(facts) => facts.clone(),
            Err(e) => vec![format!("Wolfram Alpha failed to retrieve data: {}", e)],
        };
        let articles = match &self.articles {
            Ok(articles) => articles.iter().map(NewsArticle::render).collect(),
            Err(e) => vec![format!("News API failed to retrieve articles: {}", e)],
        };

        EvidenceBundle {
            summary: Some(summary),
            facts,
            articles,
        }
    }
}

/// Evidence rendered for one request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EvidenceBundle {
    pub summary: Option<String>,
    pub facts: Vec<String>,
    pub articles: Vec<String>,
}

impl fmt::Display for EvidenceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(summary) = &self.summary {
            write!(f, "{}\n\n", summary)?;
        }
        f.write_str("Facts:")?;
        write_items(f, &self.facts)?;
        f.write_str("\n\nRecent News:")?;
        write_items(f, &self.articles)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return f.write_str("\n- (none)");
    }
    for item in items {
        write!(f, "\n- {}", item)?;
    }
    Ok(())
}

/// Outcome of checking one query against the knowledge engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FactCheck {
    Verified { query: String, answer: String },
    Unverified { query: String, error: String },
    /// The statement produced no query
    NotCheckable,
}

impl FactCheck {
    pub fn render(&self) -> String {
        match self {
            FactCheck::Verified { answer, .. } => format!("Fact: {}", answer),
            FactCheck::Unverified { .. } => FACT_CHECK_FALLBACK.to_string(),
            FactCheck::NotCheckable => OPINION_NOTICE.to_string(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, FactCheck::Verified { .. })
    }
}

pub struct EvidenceGatherer {
    knowledge: Box<dyn KnowledgeEngine>,
    encyclopedia: Box<dyn Encyclopedia>,
    news: Box<dyn NewsSearch>,
}

impl EvidenceGatherer {
    pub fn new(
        knowledge: Box<dyn KnowledgeEngine>,
        encyclopedia: Box<dyn Encyclopedia>,
        news: Box<dyn NewsSearch>,
    ) -> Self {
        Self {
            knowledge,
            encyclopedia,
            news,
        }
    }

    /// Gatherer backed by the live HTTP sources
    pub fn from_config(config: &SourceConfig) -> Result<Self, EvidenceError> {
        Ok(Self::new(
            Box::new(WolframAlphaClient::new(config)?),
            Box::new(WikipediaClient::new(config)?),
            Box::new(NewsApiClient::new(config)?),
        ))
    }

    /// Query the encyclopedia, the knowledge engine and the news search in turn
    pub fn gather(&self, term: &str) -> EvidenceReport {
        let report = EvidenceReport {
            term: term.to_string(),
            summary: self.encyclopedia.summary(term),
            facts: self.knowledge.pods(term),
            articles: self.news.search(term),
        };

        for (source, error) in [
            ("encyclopedia", report.summary.as_ref().err()),
            ("knowledge_engine", report.facts.as_ref().err()),
            ("news", report.articles.as_ref().err()),
        ] {
            if let Some(e) = error {
                warn!(source, error = %e, "evidence source degraded");
            }
        }

        report
    }

    pub fn fact_check(&self, query: Option<&Query>) -> FactCheck {
        let Some(query) = query else {
            return FactCheck::NotCheckable;
        };

        match self.knowledge.primary_answer(&query.text) {
            Ok(answer) => FactCheck::Verified {
                query: query.text.clone(),
                answer,
            },
            Err(e) => {
                warn!(query = %query, error = %e, "fact check failed");
                FactCheck::Unverified {
                    query: query.text.clone(),
                    error: e.to_string(),
                }
            }
        }
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticKnowledge;

    impl KnowledgeEngine for StaticKnowledge {
        fn pods(&self, query: &str) -> Result<Vec<String>, EvidenceError> {
            Ok(vec![format!("{} (input)", query), "42".to_string()])
        }

        fn primary_answer(&self, _query: &str) -> Result<String, EvidenceError> {
            Ok("Paris, Ile-de-France, France".to_string())
        }
    }

    struct OfflineKnowledge;

    impl KnowledgeEngine for OfflineKnowledge {
        fn pods(&self, _query: &str) -> Result<Vec<String>, EvidenceError> {
            Err(EvidenceError::MissingCredentials("Wolfram Alpha"))
        }

        fn primary_answer(&self, _query: &str) -> Result<String, EvidenceError> {
            Err(EvidenceError::Status {
                service: "Wolfram Alpha",
                status: 503,
            })
        }
    }

    struct UnreachableKnowledge;

    impl KnowledgeEngine for UnreachableKnowledge {
        fn pods(&self, _query: &str) -> Result<Vec<String>, EvidenceError> {
            panic!("knowledge engine must not be queried")
        }

        fn primary_answer(&self, _query: &str) -> Result<String, EvidenceError> {
            panic!("knowledge engine must not be queried")
        }
    }

    struct StaticEncyclopedia;

    impl Encyclopedia for StaticEncyclopedia {
        fn summary(&self, title: &str) -> Result<EncyclopediaEntry, EvidenceError> {
            Ok(EncyclopediaEntry {
                title: title.to_string(),
                summary: "A summary.".to_string(),
                url: "https://en.wikipedia.org/wiki/Test".to_string(),
            })
        }
    }

    struct MissingEncyclopedia;

    impl Encyclopedia for MissingEncyclopedia {
        fn summary(&self, title: &str) -> Result<EncyclopediaEntry, EvidenceError> {
            Err(EvidenceError::NoResults(title.to_string()))
        }
    }

    struct StaticNews;

    impl NewsSearch for StaticNews {
        fn search(&self, _query: &str) -> Result<Vec<NewsArticle>, EvidenceError> {
            Ok(vec![NewsArticle {
                title: "Headline".to_string(),
                description: Some("Body".to_string()),
                url: "https://news.example/1".to_string(),
            }])
        }
    }

    struct FailingNews;

    impl NewsSearch for FailingNews {
        fn search(&self, _query: &str) -> Result<Vec<NewsArticle>, EvidenceError> {
            Err(EvidenceError::Api("apiKeyInvalid".to_string()))
        }
    }

    fn query(text: &str) -> Query {
        Query {
            text: text.to_string(),
            trigger: None,
        }
    }

    #[test]
    fn test_gather_all_sources() {
        let gatherer = EvidenceGatherer::new(
            Box::new(StaticKnowledge),
            Box::new(StaticEncyclopedia),
            Box::new(StaticNews),
        );
        let report = gatherer.gather("Solar power");
        assert!(report.is_complete());

        let rendered = report.bundle().to_string();
        assert_eq!(
            rendered,
            "Solar power\nA summary.\nRead more: https://en.wikipedia.org/wiki/Test\n\n\
             Facts:\n- Solar power (input)\n- 42\n\n\
             Recent News:\n- Headline\nBody\nRead more: https://news.example/1"
        );
    }

    #[test]
    fn test_gather_degrades_every_source_independently() {
        let gatherer = EvidenceGatherer::new(
            Box::new(OfflineKnowledge),
            Box::new(MissingEncyclopedia),
            Box::new(FailingNews),
        );
        let report = gatherer.gather("Solar power");

        assert_eq!(
            report.degraded_sources(),
            vec!["encyclopedia", "knowledge_engine", "news"]
        );
        assert!(matches!(report.facts, Err(EvidenceError::MissingCredentials(_))));

        let bundle = report.bundle();
        assert_eq!(
            bundle.summary.as_deref(),
            Some("No Wikipedia page found: No results for \"Solar power\"")
        );
        assert_eq!(
            bundle.facts,
            vec!["Wolfram Alpha failed to retrieve data: Missing credentials for Wolfram Alpha"]
        );
        assert_eq!(
            bundle.articles,
            vec!["News API failed to retrieve articles: apiKeyInvalid"]
        );
    }

    #[test]
    fn test_partial_failure_keeps_other_sources() {
        let gatherer = EvidenceGatherer::new(
            Box::new(StaticKnowledge),
            Box::new(StaticEncyclopedia),
            Box::new(FailingNews),
        );
        let report = gatherer.gather("Tides");
        assert_eq!(report.degraded_sources(), vec!["news"]);
        assert_eq!(report.bundle().facts.len(), 2);
    }

    #[test]
    fn test_fact_check_verified() {
        let gatherer = EvidenceGatherer::new(
            Box::new(StaticKnowledge),
            Box::new(StaticEncyclopedia),
            Box::new(StaticNews),
        );
        let check = gatherer.fact_check(Some(&query("What is the capital of france")));
        assert!(check.is_verified());
        assert_eq!(check.render(), "Fact: Paris, Ile-de-France, France");
    }

    #[test]
    fn test_fact_check_failure_falls_back() {
        let gatherer = EvidenceGatherer::new(
            Box::new(OfflineKnowledge),
            Box::new(StaticEncyclopedia),
            Box::new(StaticNews),
        );
        let check = gatherer.fact_check(Some(&query("What is the capital of france")));
        assert!(matches!(check, FactCheck::Unverified { .. }));
        assert_eq!(check.render(), FACT_CHECK_FALLBACK);
    }

    #[test]
    fn test_fact_check_without_query_skips_engine() {
        let gatherer = EvidenceGatherer::new(
            Box::new(UnreachableKnowledge),
            Box::new(StaticEncyclopedia),
            Box::new(StaticNews),
        );
        let check = gatherer.fact_check(None);
        assert_eq!(check, FactCheck::NotCheckable);
        assert_eq!(check.render(), OPINION_NOTICE);
    }

    #[test]
    fn test_parse_wolfram_pods() {
        let body = r#"{"queryresult": {
            "success": true, "error": false,
            "pods": [
                {"title": "Input interpretation", "subpods": [{"plaintext": "France | capital city"}]},
                {"title": "Result", "primary": true, "subpods": [{"plaintext": "Paris, Ile-de-France, France"}]},
                {"title": "Image", "subpods": [{"plaintext": ""}]}
            ]}}"#;
        let result = parse_wolfram(body, "capital of france").unwrap();
        assert_eq!(
            result.pod_texts(),
            vec!["France | capital city", "Paris, Ile-de-France, France"]
        );
        assert_eq!(
            result.primary_text().as_deref(),
            Some("Paris, Ile-de-France, France")
        );
    }

    #[test]
    fn test_parse_wolfram_without_primary_pod() {
        let body = r#"{"queryresult": {"success": true, "error": false,
            "pods": [{"title": "Input interpretation", "subpods": [{"plaintext": "x"}]}]}}"#;
        assert!(parse_wolfram(body, "x").unwrap().primary_text().is_none());
    }

    #[test]
    fn test_parse_wolfram_errors() {
        let invalid_app = r#"{"queryresult": {"success": false,
            "error": {"code": "1", "msg": "Invalid appid"}}}"#;
        assert!(matches!(
            parse_wolfram(invalid_app, "x"),
            Err(EvidenceError::Api(msg)) if msg.contains("Invalid appid")
        ));

        let no_match = r#"{"queryresult": {"success": false, "error": false}}"#;
        assert!(matches!(
            parse_wolfram(no_match, "gibberish"),
            Err(EvidenceError::NoResults(q)) if q == "gibberish"
        ));
    }

    #[test]
    fn test_parse_summary_keeps_two_sentences() {
        let body = r#"{"type": "standard", "title": "Paris",
            "extract": "Paris is the capital of France. It has 2.1 million residents. It hosts the Louvre.",
            "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Paris"}}}"#;
        let entry = parse_summary(body, 2).unwrap();
        assert_eq!(
            entry.summary,
            "Paris is the capital of France. It has 2.1 million residents."
        );
        assert_eq!(entry.url, "https://en.wikipedia.org/wiki/Paris");
    }

    #[test]
    fn test_parse_summary_disambiguation() {
        let body = r#"{"type": "disambiguation", "title": "Mercury", "extract": "Mercury may refer to:"}"#;
        assert!(matches!(parse_summary(body, 2), Err(EvidenceError::Api(_))));
    }

    #[test]
    fn test_parse_news() {
        let body = r#"{"status": "ok", "totalResults": 2, "articles": [
            {"title": "Solar record", "description": "Output doubled", "url": "https://n/1"},
            {"title": null, "description": "", "url": "https://n/2"}
        ]}"#;
        let articles = parse_news(body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].render(), "Solar record\nOutput doubled\nRead more: https://n/1");
        assert_eq!(articles[1].title, "Untitled");
        assert!(articles[1].description.is_none());
    }

    #[test]
    fn test_parse_news_error_body() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        assert!(matches!(
            parse_news(body),
            Err(EvidenceError::Api(msg)) if msg == "Your API key is invalid."
        ));
    }

    #[test]
    fn test_missing_credentials_fail_before_network() {
        let config = SourceConfig::default();
        let wolfram = WolframAlphaClient::new(&config).unwrap();
        assert!(matches!(
            wolfram.primary_answer("What is 2+2?"),
            Err(EvidenceError::MissingCredentials("Wolfram Alpha"))
        ));

        let news = NewsApiClient::new(&config).unwrap();
        assert!(matches!(
            news.search("solar"),
            Err(EvidenceError::MissingCredentials("NewsAPI"))
        ));
    }

    #[test]
    fn test_wikipedia_summary_url_encodes_title() {
        let client = WikipediaClient::new(&SourceConfig::default()).unwrap();
        let url = client.summary_url("Age of the universe").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Age_of_the_universe"
        );
    }

    #[test]
    fn test_empty_bundle_lists() {
        let bundle = EvidenceBundle::default();
        assert_eq!(bundle.to_string(), "Facts:\n- (none)\n\nRecent News:\n- (none)");
    }
}
