//! POS bulk order export client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use super::{CredentialProvider, UpstreamError, build_http_client, check_status};
use crate::normalize::time::format_business_date;

/// Header scoping every POS request to one restaurant location
const LOCATION_HEADER: &str = "Restaurant-External-ID";

/// Hard stop for runaway pagination
const MAX_PAGES: u32 = 200;

/// Source of POS order snapshots for one business date
#[async_trait]
pub trait PosOrderSource: Send + Sync {
    async fn fetch_orders(&self, business_date: NaiveDate) -> Result<Vec<Value>, UpstreamError>;
}

pub struct PosClient {
    client: Client,
    base_url: String,
    location_id: String,
    credential: Arc<dyn CredentialProvider>,
    page_size: u32,
    page_delay: Duration,
    timeout_ms: u64,
}

impl PosClient {
    pub fn new(
        base_url: impl Into<String>,
        location_id: impl Into<String>,
        credential: Arc<dyn CredentialProvider>,
        page_size: u32,
        page_delay: Duration,
        timeout_ms: u64,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_http_client(timeout_ms)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            location_id: location_id.into(),
            credential,
            page_size: page_size.max(1),
            page_delay,
            timeout_ms,
        })
    }

    /// Fetch every order of one business date
    ///
    /// Pages are requested sequentially with `page_delay` between them; a
    /// page shorter than `page_size` is the last one.
    pub async fn fetch_orders(&self, business_date: NaiveDate) -> Result<Vec<Value>, UpstreamError> {
        let date = format_business_date(business_date);
        let mut orders = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let batch = self.fetch_page(&date, page).await?;
            let len = batch.len();
            orders.extend(batch);

            tracing::debug!(business_date = %date, page, count = len, "POS page fetched");

            if len < self.page_size as usize {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!(business_date = %date, "POS pagination hit page limit");
            }
        }

        tracing::info!(business_date = %date, count = orders.len(), "POS orders fetched");
        Ok(orders)
    }

    async fn fetch_page(&self, business_date: &str, page: u32) -> Result<Vec<Value>, UpstreamError> {
        let token = self.credential.bearer_token().await?;
        let url = format!("{}/orders/v2/ordersBulk", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(LOCATION_HEADER, &self.location_id)
            .query(&[
                ("businessDate", business_date.to_string()),
                ("page", page.to_string()),
                ("pageSize", self.page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_ms))?;

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_ms))?;

        match body {
            Value::Array(items) => Ok(items),
            other => Err(UpstreamError::Malformed(format!(
                "expected an array of orders, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl PosOrderSource for PosClient {
    async fn fetch_orders(&self, business_date: NaiveDate) -> Result<Vec<Value>, UpstreamError> {
        PosClient::fetch_orders(self, business_date).await
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
