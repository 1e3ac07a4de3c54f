use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_PAGE_LIMIT: u32 = 1000;
const ANTHROPIC_MAX_PAGES: usize = 50;
const OLLAMA_DEFAULT_HOST: &str = "http://127.0.0.1:11434";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ModelListError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model list: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelProvider {
    OpenAi {
        api_key: String,
        base_url: Option<String>,
    },
    Anthropic {
        api_key: String,
        base_url: Option<String>,
    },
    Ollama {
        host: Option<String>,
    },
    OpenAiCompatible {
        api_key: String,
        base_url: Option<String>,
    },
}

impl ModelProvider {
    pub fn name(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi { .. } => "openai",
            ModelProvider::Anthropic { .. } => "anthropic",
            ModelProvider::Ollama { .. } => "ollama",
            ModelProvider::OpenAiCompatible { .. } => "openai-compatible",
        }
    }

    fn endpoint(&self) -> Result<Url, ModelListError> {
        let raw = match self {
            ModelProvider::OpenAi { base_url, .. }
            | ModelProvider::OpenAiCompatible { base_url, .. } => {
                format!("{}/models", base_or(base_url.as_deref(), OPENAI_DEFAULT_BASE_URL))
            }
            ModelProvider::Anthropic { base_url, .. } => {
                format!(
                    "{}/v1/models",
                    base_or(base_url.as_deref(), ANTHROPIC_DEFAULT_BASE_URL)
                )
            }
            ModelProvider::Ollama { host } => {
                format!("{}/api/tags", normalize_ollama_host(host.as_deref()))
            }
        };

        Url::parse(&raw).map_err(|source| ModelListError::InvalidEndpoint {
            endpoint: raw,
            source,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            ModelProvider::OpenAi { api_key, .. }
            | ModelProvider::OpenAiCompatible { api_key, .. } => request.bearer_auth(api_key),
            ModelProvider::Anthropic { api_key, .. } => request
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            ModelProvider::Ollama { .. } => request,
        }
    }
}

fn base_or<'a>(base_url: Option<&'a str>, default: &'a str) -> &'a str {
    base_url
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
}

fn normalize_ollama_host(host: Option<&str>) -> String {
    let host = base_or(host, OLLAMA_DEFAULT_HOST);
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

pub trait ModelLister {
    async fn list_models(&self) -> Result<Vec<String>, ModelListError>;
}

pub struct HttpModelLister {
    client: Client,
    provider: ModelProvider,
}

impl HttpModelLister {
    pub fn new(provider: ModelProvider) -> Result<Self, ModelListError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, provider })
    }

    async fn get_json(&self, url: Url) -> Result<String, ModelListError> {
        let request = self.provider.authorize(self.client.get(url));
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ModelListError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }
        Ok(body)
    }

    async fn list_anthropic_models(&self, endpoint: Url) -> Result<Vec<String>, ModelListError> {
        let mut models = Vec::new();
        let mut after_id: Option<String> = None;

        for _ in 0..ANTHROPIC_MAX_PAGES {
            let mut url = endpoint.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &ANTHROPIC_PAGE_LIMIT.to_string());
                if let Some(after_id) = after_id.as_deref() {
                    query.append_pair("after_id", after_id);
                }
            }

            let page = parse_anthropic_page(&self.get_json(url).await?)?;
            models.extend(page.ids);
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after_id = Some(last_id),
                _ => break,
            }
        }

        Ok(models)
    }
}

impl ModelLister for HttpModelLister {
    async fn list_models(&self) -> Result<Vec<String>, ModelListError> {
        let endpoint = self.provider.endpoint()?;
        match &self.provider {
            ModelProvider::Anthropic { .. } => self.list_anthropic_models(endpoint).await,
            ModelProvider::Ollama { .. } => parse_ollama_names(&self.get_json(endpoint).await?),
            ModelProvider::OpenAi { .. } | ModelProvider::OpenAiCompatible { .. } => {
                parse_data_ids(&self.get_json(endpoint).await?)
            }
        }
    }
}

/// Absorbs every failure into an empty list, logging the cause.
pub async fn list_models_or_empty<L, F>(lister: &L, provider_name: &str, log: F) -> Vec<String>
where
    L: ModelLister,
    F: Fn(&str),
{
    match lister.list_models().await {
        Ok(models) => models,
        Err(error) => {
            log(&format!("{provider_name} model list unavailable: {error}"));
            Vec::new()
        }
    }
}

pub async fn list_provider_models<F>(provider: ModelProvider, log: F) -> Vec<String>
where
    F: Fn(&str),
{
    let provider_name = provider.name();
    match HttpModelLister::new(provider) {
        Ok(lister) => list_models_or_empty(&lister, provider_name, log).await,
        Err(error) => {
            log(&format!(
                "{provider_name} model list unavailable: failed to build http client: {error}"
            ));
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct AnthropicPageResponse {
    data: Vec<ModelEntry>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

struct AnthropicPage {
    ids: Vec<String>,
    has_more: bool,
    last_id: Option<String>,
}

fn parse_data_ids(body: &str) -> Result<Vec<String>, ModelListError> {
    let parsed: DataResponse = serde_json::from_str(body)?;
    Ok(parsed.data.into_iter().map(|model| model.id).collect())
}

fn parse_anthropic_page(body: &str) -> Result<AnthropicPage, ModelListError> {
    let parsed: AnthropicPageResponse = serde_json::from_str(body)?;
    Ok(AnthropicPage {
        ids: parsed.data.into_iter().map(|model| model.id).collect(),
        has_more: parsed.has_more,
        last_id: parsed.last_id,
    })
}

fn parse_ollama_names(body: &str) -> Result<Vec<String>, ModelListError> {
    let parsed: OllamaTagsResponse = serde_json::from_str(body)?;
    Ok(parsed.models.into_iter().map(|model| model.name).collect())
}
