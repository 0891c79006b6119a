use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{AppError, Result};
use crate::auth::{StaticToken, TokenProvider};
use crate::source::{DateRange, ReportRequest, ReportRow, ReportSource};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/webmasters/v3";

/// Largest page the Search Analytics API returns per request
pub const MAX_ROW_LIMIT: u32 = 25_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    start_date: String,
    end_date: String,
    dimensions: [&'a str; 1],
    row_limit: u32,
    start_row: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dimension_filter_groups: Vec<FilterGroup<'a>>,
}

#[derive(Debug, Serialize)]
struct FilterGroup<'a> {
    filters: Vec<Filter<'a>>,
}

#[derive(Debug, Serialize)]
struct Filter<'a> {
    dimension: &'a str,
    operator: &'a str,
    expression: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

/// Search Console Search Analytics client
pub struct SearchConsoleSource {
    client: Client,
    api_base: String,
    tokens: Arc<dyn TokenProvider>,
    row_limit: u32,
}

impl SearchConsoleSource {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(access_token, DEFAULT_API_BASE, MAX_ROW_LIMIT)
    }

    pub fn with_api_base(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        row_limit: u32,
    ) -> Result<Self> {
        Self::with_tokens(Arc::new(StaticToken(access_token.into())), api_base, row_limit)
    }

    /// Client that asks `tokens` for a bearer token on every request
    pub fn with_tokens(
        tokens: Arc<dyn TokenProvider>,
        api_base: impl Into<String>,
        row_limit: u32,
    ) -> Result<Self> {
        let client = Client::builder().gzip(true).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            tokens,
            row_limit: row_limit.clamp(1, MAX_ROW_LIMIT),
        })
    }

    fn query_url(&self, property: &str) -> String {
        let site: String = url::form_urlencoded::byte_serialize(property.as_bytes()).collect();
        format!("{}/sites/{}/searchAnalytics/query", self.api_base, site)
    }

    async fn fetch_page(&self, url: &str, body: &QueryBody<'_>) -> Result<Vec<ReportRow>> {
        let token = self.tokens.token().await?;
        let mut response = self.send(url, body, &token).await?;

        // One retry with a renewed token
        if response.status() == StatusCode::UNAUTHORIZED {
            let token = self.tokens.renew().await?;
            response = self.send(url, body, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<QueryResponse>().await?.rows)
    }

    async fn send(
        &self,
        url: &str,
        body: &QueryBody<'_>,
        token: &str,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }
}

#[async_trait]
impl ReportSource for SearchConsoleSource {
    async fn fetch(&self, request: &ReportRequest) -> Result<Vec<ReportRow>> {
        if request.property.trim().is_empty() {
            return Err(AppError::Other("site property is empty".into()));
        }

        let range = DateRange::lookback_from_today(request.lookback_days);
        let url = self.query_url(&request.property);

        let filters = request
            .page_filter
            .as_ref()
            .map(|f| {
                vec![FilterGroup {
                    filters: vec![Filter {
                        dimension: "page",
                        operator: f.mode.as_str(),
                        expression: &f.value,
                    }],
                }]
            })
            .unwrap_or_default();

        let mut body = QueryBody {
            start_date: range.start.format("%Y-%m-%d").to_string(),
            end_date: range.end.format("%Y-%m-%d").to_string(),
            dimensions: [request.dimension.as_str()],
            row_limit: self.row_limit,
            start_row: 0,
            dimension_filter_groups: filters,
        };

        let mut rows = Vec::new();
        loop {
            let batch = self.fetch_page(&url, &body).await?;
            let count = batch.len() as u32;
            debug!(
                property = %request.property,
                dimension = request.dimension.as_str(),
                start_row = body.start_row,
                rows = count,
                "search analytics batch"
            );
            rows.extend(batch);

            if count < self.row_limit {
                break;
            }
            body.start_row += count;
        }

        Ok(rows)
    }
}
