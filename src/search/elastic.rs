//! Elasticsearch REST engine

use crate::search::config::{RefreshPolicy, SearchConfig};
use crate::search::engine::{IndexDefinition, SearchEngine, SearchRequest};
use crate::search::error::{SearchError, SearchResult};
use crate::search::filter::FilterExpression;
use crate::search::script::UpdateScript;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const ALREADY_EXISTS: &str = "resource_already_exists_exception";
const INDEX_NOT_FOUND: &str = "index_not_found_exception";

/// [`SearchEngine`] speaking the Elasticsearch REST API over reqwest
#[derive(Clone)]
pub struct ElasticEngine {
    client: Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
    refresh: RefreshPolicy,
    request_timeout_ms: u64,
}

impl ElasticEngine {
    /// Build the HTTP client without contacting the engine
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let base = Url::parse(&config.url).map_err(|e| {
            SearchError::InvalidConfiguration(format!("Invalid engine URL {}: {}", config.url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(SearchError::InvalidConfiguration(format!(
                "Engine URL {} cannot carry a path",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("docsys/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            refresh: config.refresh,
            request_timeout_ms: config.request_timeout_ms,
        })
    }

    /// Build the client and, when configured, verify the engine answers
    pub async fn connect(config: &SearchConfig) -> SearchResult<Self> {
        let engine = Self::new(config)?;

        if config.ping_on_connect {
            engine.ping().await?;
            info!(url = %config.url, "Connected to search engine");
        }

        Ok(engine)
    }

    fn url(&self, segments: &[&str]) -> SearchResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::InvalidConfiguration(format!("Engine URL {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> SearchResult<RequestBuilder> {
        let url = self.url(segments)?;
        let mut builder = self.client.request(method, url);
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_ref());
        }
        Ok(builder)
    }

    fn engine_timeout(&self) -> String {
        format!("{}ms", self.request_timeout_ms)
    }
}

/// Read the body of a response, mapping non-success statuses to typed errors
async fn read_body(response: Response, index: &str) -> SearchResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    Err(classify(status, &body, index))
}

fn classify(status: StatusCode, body: &str, index: &str) -> SearchError {
    let err = SearchError::from_response(status.as_u16(), body);
    let error_type = err.error_type().map(str::to_string);

    match error_type.as_deref() {
        Some(ALREADY_EXISTS) => SearchError::IndexAlreadyExists(index.to_string()),
        Some(INDEX_NOT_FOUND) => SearchError::IndexNotFound(index.to_string()),
        _ => err,
    }
}

#[async_trait]
impl SearchEngine for ElasticEngine {
    async fn ping(&self) -> SearchResult<()> {
        let response = self.request(Method::GET, &[])?.send().await?;
        read_body(response, "").await.map(|_| ())
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self.request(Method::HEAD, &[index])?.send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                warn!(index = %index, status = status.as_u16(), "Unexpected index existence status");
                Err(SearchError::from_response(status.as_u16(), ""))
            }
        }
    }

    async fn create_index(&self, index: &str, definition: &IndexDefinition) -> SearchResult<()> {
        let response = self
            .request(Method::PUT, &[index])?
            .json(&definition.to_body())
            .send()
            .await?;

        read_body(response, index).await.map(|_| ())
    }

    async fn index_document(&self, index: &str, id: &str, source: &Value) -> SearchResult<()> {
        let mut builder = self.request(Method::PUT, &[index, "_doc", id])?.json(source);
        if let Some(refresh) = self.refresh.document_param() {
            builder = builder.query(&[("refresh", refresh)]);
        }

        let response = builder.send().await?;
        read_body(response, index).await?;
        debug!(index = %index, id = %id, "Document indexed");
        Ok(())
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<String> {
        let response = self
            .request(Method::POST, &[index, "_search"])?
            .query(&[("timeout", self.engine_timeout())])
            .json(&request.to_body())
            .send()
            .await?;

        read_body(response, index).await
    }

    async fn update_by_query(
        &self,
        index: &str,
        filter: &FilterExpression,
        script: &UpdateScript,
    ) -> SearchResult<String> {
        let mut builder = self
            .request(Method::POST, &[index, "_update_by_query"])?
            .query(&[("conflicts", "proceed")])
            .json(&json!({
                "query": filter.to_query(),
                "script": script.to_body(),
            }));
        if let Some(refresh) = self.refresh.by_query_param() {
            builder = builder.query(&[("refresh", refresh)]);
        }

        let response = builder.send().await?;
        read_body(response, index).await
    }

    async fn delete_by_query(&self, index: &str, filter: &FilterExpression) -> SearchResult<String> {
        let mut builder = self
            .request(Method::POST, &[index, "_delete_by_query"])?
            .query(&[("conflicts", "proceed")])
            .json(&json!({ "query": filter.to_query() }));
        if let Some(refresh) = self.refresh.by_query_param() {
            builder = builder.query(&[("refresh", refresh)]);
        }

        let response = builder.send().await?;
        read_body(response, index).await
    }

    async fn refresh(&self, index: &str) -> SearchResult<()> {
        let response = self.request(Method::POST, &[index, "_refresh"])?.send().await?;
        read_body(response, index).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::SearchConfigBuilder;

    #[test]
    fn test_invalid_url_rejected() {
        let config = SearchConfigBuilder::new().url("not a url").build();
        assert!(matches!(
            ElasticEngine::new(&config),
            Err(SearchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_url_segments_are_escaped() {
        let config = SearchConfigBuilder::new().url("http://localhost:9200/").build();
        let engine = ElasticEngine::new(&config).unwrap();

        let url = engine.url(&["users_19092022", "_doc", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/users_19092022/_doc/a%2Fb");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let config = SearchConfigBuilder::new().url("http://proxy:8080/es").build();
        let engine = ElasticEngine::new(&config).unwrap();

        let url = engine.url(&["documents_19092022", "_search"]).unwrap();
        assert_eq!(url.path(), "/es/documents_19092022/_search");
    }

    #[test]
    fn test_classify_engine_errors() {
        let body = r#"{"error":{"type":"index_not_found_exception","reason":"no such index [users_19092022]"},"status":404}"#;
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, body, "users_19092022"),
            SearchError::IndexNotFound(index) if index == "users_19092022"
        ));

        let body = r#"{"error":{"type":"resource_already_exists_exception","reason":"exists"},"status":400}"#;
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, body, "users_19092022"),
            SearchError::IndexAlreadyExists(_)
        ));

        let body = r#"{"error":{"type":"mapper_parsing_exception","reason":"bad mapping"},"status":400}"#;
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, body, "users_19092022"),
            SearchError::Status { status: 400, .. }
        ));
    }
}
