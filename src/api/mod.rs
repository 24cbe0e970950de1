//! # Contract / Payment API Client
//!
//! Thin async wrapper over the three list endpoints. Every endpoint answers
//! with an envelope `{ "data": [...], "message": "..." }`; the envelope is
//! checked explicitly rather than trusted, and only `data` is returned.
//!
//! Failures propagate once. There is no retry or backoff; the caller
//! decides what to do with an error.

pub mod listing;
pub mod types;

use log::debug;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{RepairDocError, Result};
pub use listing::{paginate_list, ListPage};
pub use types::{Contract, PaymentDetail, PaymentRound};

pub struct ApiClient {
    base_url: String,
    http_client: HttpClient,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /contract?center=<center>`
    pub async fn contracts(&self, center: Option<&str>) -> Result<Vec<Contract>> {
        let query: Vec<(&str, String)> = center
            .map(|c| vec![("center", c.to_string())])
            .unwrap_or_default();
        self.get_list("/contract", &query).await
    }

    /// `GET /payment?contractId=<id>`. The contract id is required; without
    /// it the call fails before any request is made.
    pub async fn payments(&self, contract_id: Option<i64>) -> Result<Vec<PaymentRound>> {
        let contract_id = contract_id.ok_or(RepairDocError::MissingParameter("contractId"))?;
        self.get_list("/payment", &[("contractId", contract_id.to_string())])
            .await
    }

    /// `GET /payment/{id}`
    pub async fn payment_detail(&self, id: i64) -> Result<Vec<PaymentDetail>> {
        self.get_list(&format!("/payment/{id}"), &[]).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.http_client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepairDocError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        unwrap_envelope(&body)
    }
}

/// Validate a `{ data: [...], message }` envelope and decode its items.
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| RepairDocError::Schema(format!("response is not JSON: {e}")))?;

    let Value::Object(mut envelope) = value else {
        return Err(RepairDocError::Schema(
            "response envelope is not an object".to_string(),
        ));
    };

    match envelope.get("message") {
        None | Some(Value::Null) => {}
        Some(Value::String(message)) => debug!("server message: {}", message),
        Some(_) => {
            return Err(RepairDocError::Schema(
                "`message` is not a string".to_string(),
            ))
        }
    }

    let items = match envelope.remove("data") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RepairDocError::Schema(
                "`data` is not an array".to_string(),
            ))
        }
        None => return Err(RepairDocError::Schema("`data` is missing".to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| RepairDocError::Schema(format!("data[{i}]: {e}")))
        })
        .collect()
}
