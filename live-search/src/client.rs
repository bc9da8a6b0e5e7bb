//! HTTP backend for the live-search endpoint

use async_trait::async_trait;
use log::debug;
use url::Url;

use crate::config::LiveSearchConfig;
use crate::interface::{LiveSearchError, SearchBackend, SearchQuery};
use crate::models::{LiveResponse, SearchResultSet};

pub const LIVE_ENDPOINT: &str = "/api/live/";

const USER_AGENT: &str = concat!("rbt-live-search/", env!("CARGO_PKG_VERSION"));

/// Talks to `GET /api/live/`. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct LiveSearchClient {
    http: reqwest::Client,
    endpoint: Url,
    limit: u32,
    per_category: usize,
}

impl LiveSearchClient {
    pub fn new(config: &LiveSearchConfig) -> Result<Self, LiveSearchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.base_url.join(LIVE_ENDPOINT)?,
            limit: config.limit,
            per_category: config.per_category,
        })
    }

    /// Full request URL for a query, parameters form-encoded
    pub fn request_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &query.text)
            .append_pair("scope", query.scope.as_str())
            .append_pair("limit", &self.limit.to_string())
            .append_pair("type", query.search_type.as_str());
        url
    }

    /// Issue the request and decode the body without categorizing it
    pub async fn fetch(&self, query: &SearchQuery) -> Result<LiveResponse, LiveSearchError> {
        let url = self.request_url(query);
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error pages sometimes still carry the JSON `{error}` shape
            return match serde_json::from_str::<LiveResponse>(&body) {
                Ok(LiveResponse { error: Some(message), .. }) => Err(LiveSearchError::Server(message)),
                _ => Err(LiveSearchError::Status(status.as_u16())),
            };
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SearchBackend for LiveSearchClient {
    async fn live_search(&self, query: &SearchQuery) -> Result<SearchResultSet, LiveSearchError> {
        let response = self.fetch(query).await?;
        SearchResultSet::from_response(response, self.per_category)
    }
}
