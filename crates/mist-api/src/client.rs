use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::assist::{Completion, CompletionRequest, InstructionPage};
use crate::config::ClientConfig;
use crate::error::{MistError, Result};
use crate::model::{
    parse_page, Collection, InsertedDocument, Item, Page, Record, SearchResponse,
};
use crate::ranking::{MetaInfo, MetaInfoResponse};

/// Default number of hits returned by text search
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    /// Filter term; omitted from the request when empty
    pub name: String,
}

/// The MIST backend as seen by the paging and selection machinery.
pub trait MistApi: Send + Sync {
    fn list_page(&self, collection: &Collection, query: &PageQuery) -> Result<Page>;

    fn get_detail(&self, collection: &Collection, id: &str) -> Result<Record>;

    /// Raw label similarities for a document, in server order.
    fn get_meta_info(&self, id: &str, labels: &[String]) -> Result<Vec<MetaInfo>>;

    fn search_by_text(&self, text: &str, limit: u32) -> Result<Vec<Item>>;

    /// Store a new document whose image lives at `image_url`.
    fn insert_document(&self, name: &str, image_url: &str) -> Result<InsertedDocument>;

    fn list_instructions(&self, page: u32, page_size: u32) -> Result<InstructionPage>;

    fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Guard for meta-info requests: without labels there is nothing to score.
pub fn require_labels(labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Err(MistError::PreconditionNotMet("no labels configured"));
    }
    Ok(())
}

fn require_text(value: &str, what: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MistError::PreconditionNotMet(what));
    }
    Ok(())
}

#[derive(Serialize)]
struct MetaInfoRequest<'a> {
    id: &'a str,
    labels: &'a [String],
}

#[derive(Serialize)]
struct SearchByTextRequest<'a> {
    query_text: &'a str,
    limit: u32,
}

/// Blocking HTTP implementation of `MistApi`
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("mist/", env!("CARGO_PKG_VERSION")));
        // A backend on this machine must never be routed through a system proxy
        if is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| MistError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let text = self.get_text(path, query)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = self.config.endpoint(path);
        log::debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send();
        read_body(response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.config.endpoint(path);
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send();
        Ok(serde_json::from_str(&read_body(response)?)?)
    }

    fn post_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.config.endpoint(path);
        log::debug!("POST {} {:?}", url, query);
        let response = self.client.post(&url).query(query).send();
        Ok(serde_json::from_str(&read_body(response)?)?)
    }
}

fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = url::Url::parse(base_url) else {
        return false;
    };
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Single normalization point for transport and status errors.
fn read_body(response: reqwest::Result<Response>) -> Result<String> {
    let response = response?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(MistError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.text()?)
}

impl MistApi for HttpClient {
    fn list_page(&self, collection: &Collection, query: &PageQuery) -> Result<Page> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
        ];
        if !query.name.is_empty() {
            params.push(("name", query.name.clone()));
        }
        let body = self.get_text(&collection.list_endpoint, &params)?;
        parse_page(&body, &collection.items_field)
    }

    fn get_detail(&self, collection: &Collection, id: &str) -> Result<Record> {
        let path = format!("{}/{}", collection.detail_endpoint, urlencoding::encode(id));
        self.get(&path, &[("include_embeddings", "false".to_string())])
    }

    fn get_meta_info(&self, id: &str, labels: &[String]) -> Result<Vec<MetaInfo>> {
        require_labels(labels)?;
        let response: MetaInfoResponse =
            self.post("get-meta-info", &MetaInfoRequest { id, labels })?;
        Ok(response.meta_info)
    }

    fn search_by_text(&self, text: &str, limit: u32) -> Result<Vec<Item>> {
        let response: SearchResponse = self.post(
            "search-by-text",
            &SearchByTextRequest {
                query_text: text,
                limit,
            },
        )?;
        Ok(response.results)
    }

    fn insert_document(&self, name: &str, image_url: &str) -> Result<InsertedDocument> {
        require_text(name, "document name is empty")?;
        require_text(image_url, "image url is empty")?;
        self.post_query(
            "insert-document",
            &[("name", name.trim()), ("image_url", image_url.trim())],
        )
    }

    fn list_instructions(&self, page: u32, page_size: u32) -> Result<InstructionPage> {
        self.get(
            "instructions",
            &[
                ("page", page.max(1).to_string()),
                ("page_size", page_size.clamp(1, 100).to_string()),
            ],
        )
    }

    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        require_text(&request.user_prompt, "prompt is empty")?;
        self.post("ai/completions", request)
    }
}
