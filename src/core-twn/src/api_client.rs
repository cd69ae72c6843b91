//! HTTP client for the ingestion API, used by the scraper and annotation workers.

use std::time::Duration;

use data_model_twn::api::{
    AddAiNewsPayload, AddAiNewsResponse, AiHandleNews, AiHandlePayload, ClaimPayload, ClaimedNews,
    InsertNewsResponse, NewsDetail, NewsDraft, UpdateNewsPayload, UpdateNewsResponse,
};
use data_model_twn::models::{AiModel, SourceWebsite};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::Error;
use crate::common::hostname::get_api_base_url;
use crate::common::poll_interval::{TimeUnit, duration_from_env};

pub const DEFAULT_HTTP_TIMEOUT_S: u64 = 30;

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/');
        Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// API location from API_BASE_URL (or HOST/PORT), request timeout from HTTP_TIMEOUT_S.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = get_api_base_url().map_err(|e| Error::InvalidConfig {
            var: "API_BASE_URL".to_string(),
            reason: e.to_string(),
        })?;
        let timeout = duration_from_env(TimeUnit::Seconds, "HTTP_TIMEOUT_S", DEFAULT_HTTP_TIMEOUT_S)?;
        Self::new(&base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST /news
    pub async fn post_news(&self, items: &[NewsDraft]) -> Result<InsertNewsResponse, Error> {
        let response = self.client.post(self.endpoint("news")).json(items).send().await?;
        expect_json(response, StatusCode::OK).await
    }

    /// PUT /news/{id}
    pub async fn update_news(&self, id: i32, payload: &UpdateNewsPayload) -> Result<UpdateNewsResponse, Error> {
        let response = self
            .client
            .put(self.endpoint(&format!("news/{}", id)))
            .json(payload)
            .send()
            .await?;
        expect_json(response, StatusCode::OK).await
    }

    /// GET /news/{id}
    pub async fn get_news(&self, id: i32) -> Result<NewsDetail, Error> {
        let response = self.client.get(self.endpoint(&format!("news/{}", id))).send().await?;
        expect_json(response, StatusCode::OK).await
    }

    /// POST /wait_query_list: claims up to `count` listed articles of one site for detail fetching.
    pub async fn claim_news(&self, source: SourceWebsite, count: i64) -> Result<Vec<ClaimedNews>, Error> {
        let payload = ClaimPayload {
            source_website: source.into(),
            count: Some(count),
        };
        let response = self
            .client
            .post(self.endpoint("wait_query_list"))
            .json(&payload)
            .send()
            .await?;
        expect_json(response, StatusCode::OK).await
    }

    /// POST /wait_ai_handle_list: fetched articles `model` hasn't annotated yet, minus `exclude`.
    pub async fn wait_ai_handle_list(
        &self,
        count: i64,
        model: AiModel,
        exclude: &[i32],
    ) -> Result<Vec<AiHandleNews>, Error> {
        let payload = AiHandlePayload {
            count: Some(count),
            ai_model: Some(model.into()),
            exclude: exclude.to_vec(),
        };
        let response = self
            .client
            .post(self.endpoint("wait_ai_handle_list"))
            .json(&payload)
            .send()
            .await?;
        expect_json(response, StatusCode::OK).await
    }

    /// POST /add_ai_news
    pub async fn add_ai_news(&self, payload: &AddAiNewsPayload) -> Result<AddAiNewsResponse, Error> {
        let response = self
            .client
            .post(self.endpoint("add_ai_news"))
            .json(payload)
            .send()
            .await?;
        expect_json(response, StatusCode::CREATED).await
    }
}

/// Decodes the body when the status is the one the endpoint answers on success.
/// Anything else becomes `Error::UnexpectedStatus` carrying the API's error body.
async fn expect_json<T: DeserializeOwned>(response: reqwest::Response, expected: StatusCode) -> Result<T, Error> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = NewsApiClient::new("http://127.0.0.1:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.endpoint("news/3"), "http://127.0.0.1:5000/news/3");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = NewsApiClient::new("127.0.0.1 port 5000", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = NewsApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let result = client.claim_news(SourceWebsite::Ttv, 1).await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
