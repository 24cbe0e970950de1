//! Payload types for the contract/payment API.
//!
//! Only the fields the tool reads are typed; everything else the server
//! sends is kept in `extra` so listings can still show it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::lenient;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "contractName", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub center: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One payment round of a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRound {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub contract_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub round: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A work order inside a payment round, with its cost breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    #[serde(default, deserialize_with = "lenient::text")]
    pub round: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub center: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub order_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub order_number: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub order_date: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub material_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub labor_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expense_cost: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_cost: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
