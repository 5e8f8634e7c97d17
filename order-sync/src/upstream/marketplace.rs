//! Marketplace GraphQL client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{CredentialProvider, UpstreamError, build_http_client, check_status};
use crate::resolver::OrderLookup;

/// Fields consumed by the marketplace adapter
const ORDER_QUERY: &str = r#"
query Order($id: ID!) {
  order(id: $id) {
    uuid
    orderNumber
    status
    createdAt
    specialInstructions
    event {
      timestamp
      catererHandoffFoodTime
      orderType
      headcount
      deliveryInstructions
      address { street street2 city state zip }
    }
    orderCustomer { fullName firstName lastName email phone }
    totals {
      subTotal { subunits currency }
      salesTax { subunits currency }
      tip { subunits currency }
      deliveryFee { subunits currency }
      customerTotalDue { subunits currency }
    }
    catererCart {
      orderItems {
        uuid
        name
        quantity
        unitPrice { subunits currency }
        totalInSubunits { subunits currency }
        specialInstructions
        customizations { name quantity }
      }
    }
  }
}
"#;

pub struct MarketplaceClient {
    client: Client,
    endpoint: String,
    credential: Arc<dyn CredentialProvider>,
    timeout_ms: u64,
}

impl MarketplaceClient {
    pub fn new(
        endpoint: impl Into<String>,
        credential: Arc<dyn CredentialProvider>,
        timeout_ms: u64,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_http_client(timeout_ms)?,
            endpoint: endpoint.into(),
            credential,
            timeout_ms,
        })
    }

    /// Exact lookup by order id: `data.order` or `None`
    pub async fn fetch_order(&self, id: &str) -> Result<Option<Value>, UpstreamError> {
        let token = self.credential.bearer_token().await?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({ "query": ORDER_QUERY, "variables": { "id": id } }))
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_ms))?;

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout_ms))?;

        extract_order(body)
    }
}

/// GraphQL envelope → order object
///
/// `errors` wins over partial `data`; an absent or null order is a miss.
fn extract_order(mut body: Value) -> Result<Option<Value>, UpstreamError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array)
        && !errors.is_empty()
    {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        return Err(UpstreamError::GraphQl(if messages.is_empty() {
            "unknown GraphQL error".to_string()
        } else {
            messages.join("; ")
        }));
    }

    let Some(data) = body.get_mut("data") else {
        return Err(UpstreamError::Malformed("response has no `data`".into()));
    };
    match data.get_mut("order").map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(order @ Value::Object(_)) => Ok(Some(order)),
        Some(_) => Err(UpstreamError::Malformed("`data.order` is not an object".into())),
    }
}

#[async_trait]
impl OrderLookup for MarketplaceClient {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Value>, UpstreamError> {
        self.fetch_order(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_order_hit() {
        let body = json!({ "data": { "order": { "uuid": "u-1" } } });
        let order = extract_order(body).unwrap().unwrap();
        assert_eq!(order["uuid"], "u-1");
    }

    #[test]
    fn test_extract_order_miss() {
        assert!(extract_order(json!({ "data": { "order": null } })).unwrap().is_none());
        assert!(extract_order(json!({ "data": {} })).unwrap().is_none());
    }

    #[test]
    fn test_extract_order_graphql_errors() {
        let body = json!({
            "data": { "order": null },
            "errors": [{ "message": "rate limited" }, { "message": "try later" }]
        });
        match extract_order(body) {
            Err(UpstreamError::GraphQl(msg)) => assert_eq!(msg, "rate limited; try later"),
            other => panic!("expected GraphQl error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_order_malformed() {
        assert!(matches!(
            extract_order(json!({ "oops": true })),
            Err(UpstreamError::Malformed(_))
        ));
        assert!(matches!(
            extract_order(json!({ "data": { "order": 42 } })),
            Err(UpstreamError::Malformed(_))
        ));
    }
}
