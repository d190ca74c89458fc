use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use scraper::{Html, Node, Selector};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::configuration::LlmSettings;

const MAX_PAGE_CHARS: usize = 16_000;

const SYSTEM_PROMPT: &str = "You extract information from web pages. \
Answer only from the page content you are given and follow the requested output format exactly.";

const HIDDEN_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "template", "head", "svg"];

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("language model request failed: {0}")]
    Model(#[from] OpenAIError),
    #[error("language model returned no content")]
    EmptyResponse,
    #[error("page has no readable text: {0}")]
    EmptyPage(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Structured(Map<String, Value>),
    Text(String),
    Other(Value),
}

impl Extraction {
    pub fn kind(&self) -> &'static str {
        match self {
            Extraction::Structured(_) => "mapping",
            Extraction::Text(_) => "text",
            Extraction::Other(_) => "other",
        }
    }
}

#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    async fn extract(&self, url: &str, prompt: &str) -> Result<Extraction, ExtractionError>;
}

pub struct SmartScraper {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl SmartScraper {
    pub fn new(settings: &LlmSettings) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(fake_user_agent::get_rua())
            .build()?;

        let config = OpenAIConfig::new()
            .with_api_base(settings.base_url.clone())
            .with_api_key(settings.api_key.expose_secret());

        Ok(SmartScraper {
            client: Client::with_config(config).with_http_client(http.clone()),
            http,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
        })
    }

    pub async fn fetch_page_text(&self, url: &str) -> Result<String, ExtractionError> {
        let html = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = visible_text(&html);
        match text.is_empty() {
            true => Err(ExtractionError::EmptyPage(url.to_string())),
            false => Ok(text),
        }
    }

    async fn ask(&self, prompt: &str, url: &str, page_text: &str) -> Result<String, ExtractionError> {
        let user_message = format!(
            "{}\n\nSource URL: {}\n\nPage content:\n{}",
            prompt.trim(),
            url,
            page_text
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()?
                    .into(),
            ])
            .temperature(self.temperature)
            .top_p(self.top_p)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractionError::EmptyResponse)
    }
}

#[async_trait]
impl ExtractionEngine for SmartScraper {
    async fn extract(&self, url: &str, prompt: &str) -> Result<Extraction, ExtractionError> {
        let page_text = self.fetch_page_text(url).await?;
        log::debug!("Fetched {} characters from {}", page_text.len(), url);

        let answer = self.ask(prompt, url, &page_text).await?;
        log::info!("Model answer for {}: {}", url, answer);

        Ok(parse_answer(&answer))
    }
}

pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").unwrap();

    let mut chunks: Vec<String> = document
        .select(&title_selector)
        .map(|t| t.text().collect::<String>())
        .collect();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            chunks.push(text.to_string());
        }
    }

    let collapsed = chunks
        .iter()
        .flat_map(|c| c.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    collapsed.chars().take(MAX_PAGE_CHARS).collect()
}

pub fn parse_answer(answer: &str) -> Extraction {
    let body = strip_code_fence(answer);

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match unwrap_content(&map) {
            Some(inner) => parse_answer(inner),
            None => Extraction::Structured(map),
        },
        Ok(Value::String(s)) => Extraction::Text(s.trim().to_string()),
        Ok(other) => Extraction::Other(other),
        Err(_) => Extraction::Text(body.to_string()),
    }
}

// Some models wrap plain answers as {"content": "..."}.
fn unwrap_content(map: &Map<String, Value>) -> Option<&str> {
    match (map.len(), map.get("content")) {
        (1, Some(Value::String(inner))) => Some(inner.as_str()),
        _ => None,
    }
}

fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
