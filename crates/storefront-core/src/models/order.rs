use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Service, User};

/// Main lifecycle status of an order. Transitions are enforced server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum OrderStatus {
    #[default]
    New,
    Validated,
    InProgress,
    Completed,
    Archived,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Validated => "Validated",
            OrderStatus::InProgress => "In progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Archived => "Archived",
        }
    }
}

/// Where an order is in the deposit/final payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PaymentStatus {
    #[default]
    PendingDeposit,
    DepositPaid,
    PendingFinal,
    FullyPaid,
}

impl OrderStatus {
    /// Wire value, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Validated => "VALIDATED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Archived => "ARCHIVED",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::PendingDeposit => "PENDING_DEPOSIT",
            PaymentStatus::DepositPaid => "DEPOSIT_PAID",
            PaymentStatus::PendingFinal => "PENDING_FINAL",
            PaymentStatus::FullyPaid => "FULLY_PAID",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::PendingDeposit => "Awaiting deposit",
            PaymentStatus::DepositPaid => "Deposit paid",
            PaymentStatus::PendingFinal => "Awaiting final payment",
            PaymentStatus::FullyPaid => "Fully paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub unit_amount: f64,
    pub total_amount: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status_main: OrderStatus,
    pub status_payment: PaymentStatus,
    pub total_amount: f64,
    pub deposit_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_payment_intent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Short display reference: `#` followed by the last six id characters.
    pub fn reference(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => {
                let start = id
                    .char_indices()
                    .rev()
                    .nth(5)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                format!("#{}", &id[start..])
            }
            _ => "N/A".to_string(),
        }
    }

    /// Amount still owed once the deposit has been paid
    pub fn balance_amount(&self) -> f64 {
        self.total_amount - self.deposit_amount
    }
}

/// Line of an order being created; server fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OrderItemInput {
    pub service_id: String,
    pub quantity: u32,
    pub unit_amount: f64,
    pub total_amount: f64,
}

/// Body of `POST /orders/with-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewOrder {
    pub status_main: OrderStatus,
    pub status_payment: PaymentStatus,
    pub total_amount: f64,
    pub deposit_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<DateTime<Utc>>,
    pub user_id: String,
    pub order_items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_main: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_payment: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<DateTime<Utc>>,
}

/// Body of `POST /order-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewOrderItem {
    pub unit_amount: f64,
    pub total_amount: f64,
    pub quantity: u32,
    pub order_id: String,
    pub service_id: String,
}

/// Partial order line edit. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

/// Query filters for the admin order listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Which part of the split payment a payment link is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PaymentType {
    Deposit,
    Final,
}

/// Hosted checkout session created by the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PaymentSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}
