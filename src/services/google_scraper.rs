use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::configuration::SearchSettings;

const NO_RESULTS_MARKER: &str = "did not match any documents";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blocked by captcha on query: {0}")]
    Blocked(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<String>, SearchError>;
}

pub struct GoogleSearcher {
    client: reqwest::Client,
    base_url: String,
    pause: Duration,
    results_per_page: usize,
}

impl GoogleSearcher {
    pub fn new(settings: &SearchSettings) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(fake_user_agent::get_rua())
            .read_timeout(Duration::from_secs(30))
            .build()?;

        Ok(GoogleSearcher {
            client,
            base_url: settings.base_url.clone(),
            pause: settings.pause,
            results_per_page: settings.results_per_page,
        })
    }

    async fn fetch_page(&self, query: &str, start: usize) -> Result<String, SearchError> {
        let params = [
            ("q", query.to_string()),
            ("num", self.results_per_page.to_string()),
            ("start", start.to_string()),
            ("hl", "en".to_string()),
        ];

        let html = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(html)
    }
}

#[async_trait]
impl SearchProvider for GoogleSearcher {
    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<String>, SearchError> {
        if limit == Some(0) {
            return Ok(vec![]);
        }

        let mut urls = vec![];
        let mut seen = HashSet::new();
        let mut start = 0;

        loop {
            tokio::time::sleep(self.pause).await;

            let html = self.fetch_page(query, start).await?;
            let (links, has_next) = match parse_result_page(&html) {
                ResultPage::Blocked => return Err(SearchError::Blocked(query.to_string())),
                ResultPage::NotFound => {
                    log::info!("Found no results on query: {}", query);
                    break;
                }
                ResultPage::Results { links, has_next } => (links, has_next),
            };

            let mut fresh = 0;
            for link in links {
                if seen.insert(link.clone()) {
                    urls.push(link);
                    fresh += 1;
                    if limit.is_some_and(|l| urls.len() >= l) {
                        return Ok(urls);
                    }
                }
            }

            log::info!("Found {} new urls, next page? {}", fresh, has_next);
            if fresh == 0 || !has_next {
                break;
            }
            start += self.results_per_page;
        }

        Ok(urls)
    }
}

#[derive(Debug, PartialEq)]
pub enum ResultPage {
    NotFound,
    Blocked,
    Results { links: Vec<String>, has_next: bool },
}

pub fn parse_result_page(html_content: &str) -> ResultPage {
    let a_tag_selector = Selector::parse("a[href]").unwrap();
    let h3_selector = Selector::parse("h3").unwrap();
    let next_selector = Selector::parse(r#"a#pnnext, footer a[href*="start="]"#).unwrap();

    let html_document = Html::parse_document(html_content);

    let links: Vec<String> = html_document
        .select(&a_tag_selector)
        .filter_map(|tag| tag.value().attr("href"))
        .filter_map(extract_result_url)
        .collect();

    let has_headings = html_document.select(&h3_selector).next().is_some();

    match (links.is_empty(), has_headings) {
        (true, false) => match html_content.contains(NO_RESULTS_MARKER) {
            true => ResultPage::NotFound,
            false => ResultPage::Blocked,
        },
        _ => ResultPage::Results {
            links,
            has_next: html_document.select(&next_selector).next().is_some(),
        },
    }
}

/// Turns a result anchor into the target URL, unwrapping `/url?q=` redirects
/// and dropping anything that points back at Google.
pub fn extract_result_url(href: &str) -> Option<String> {
    let target = match href.strip_prefix("/url?") {
        Some(redirect) => {
            let parsed = Url::parse(&format!("https://www.google.com/url?{}", redirect)).ok()?;
            let (_, target) = parsed
                .query_pairs()
                .find(|(key, _)| key == "q" || key == "url")?;
            target.into_owned()
        }
        None => href.to_string(),
    };

    let parsed_url = Url::parse(&target).ok()?;
    if !matches!(parsed_url.scheme(), "http" | "https") {
        return None;
    }

    match parsed_url.host_str() {
        None | Some("") => None,
        Some(host) if host.contains("google.") || host.ends_with("googleusercontent.com") => None,
        Some(_) => Some(parsed_url.to_string()),
    }
}
