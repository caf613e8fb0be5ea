//! Document fetcher backed by the itinerary HTTP API.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderValue, IF_NONE_MATCH};

use super::{ConditionalHeaders, DocumentFetcher, FetchOutcome};
use crate::fetch::{FetchError, RequestDescriptor, RetryClient};
use crate::retry::RetryOptions;

const FETCH_LABEL: &str = "itinerary.fetch";

/// Fetches `GET {base_url}/itineraries/{id}` through a [`RetryClient`].
#[derive(Clone)]
pub struct HttpDocumentFetcher {
    client: RetryClient,
    base_url: Url,
    options: RetryOptions,
}

impl HttpDocumentFetcher {
    pub fn new(client: RetryClient, base_url: Url, options: RetryOptions) -> Self {
        Self { client, base_url, options }
    }

    /// URL of one itinerary; the id is percent-encoded as a single segment.
    pub fn document_url(&self, id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Build(format!("base URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .push("itineraries")
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, id: &str, conditional: &ConditionalHeaders) -> Result<FetchOutcome, FetchError> {
        let mut request =
            RequestDescriptor::get(self.document_url(id)?).header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(etag) = &conditional.if_none_match {
            let value = HeaderValue::from_str(etag).map_err(|e| FetchError::Build(format!("invalid ETag: {}", e)))?;
            request = request.header(IF_NONE_MATCH, value);
        }

        let response = self.client.fetch(FETCH_LABEL, &request, &self.options).await?;
        let status = response.status;
        let etag = response.etag();
        Ok(FetchOutcome { status, data: response.into_json(), etag })
    }
}
