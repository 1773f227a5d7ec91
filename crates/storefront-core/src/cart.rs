//! Locally persisted shopping cart.
//!
//! The cart lives entirely on the client and is saved to the key-value store
//! after every change. Prices are indicative only; the server recomputes
//! totals when the order is created.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::models::{NewOrder, OrderItemInput, OrderStatus, PaymentStatus, Service};
use crate::storage::KeyValueStore;

/// Storage key for the saved cart
pub const CART_KEY: &str = "user_cart";

/// Share of the order total asked up front.
pub const DEPOSIT_RATE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CartItem {
    pub service_id: String,
    pub service: Service,
    pub quantity: u32,
    pub unit_amount: f64,
    pub total_amount: f64,
}

impl CartItem {
    fn recompute(&mut self) {
        self.total_amount = self.unit_amount * self.quantity as f64;
    }
}

pub struct Cart {
    items: Vec<CartItem>,
    store: Arc<dyn KeyValueStore>,
}

impl Cart {
    /// Load the saved cart. A missing or unreadable cart starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match store.get(CART_KEY) {
            Ok(Some(saved)) => serde_json::from_str(&saved).unwrap_or_else(|e| {
                warn!(error = %e, "Saved cart is corrupt, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read saved cart");
                Vec::new()
            }
        };
        Self { items, store }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.total_amount).sum()
    }

    /// Number of units across all lines, saturating at `u32::MAX`
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, i| count.saturating_add(i.quantity))
    }

    /// Add `quantity` of a service, merging with an existing line.
    ///
    /// Services without an id cannot be ordered and are ignored.
    pub fn add(&mut self, service: &Service, quantity: u32) {
        let Some(service_id) = service.id.clone() else {
            warn!(name = %service.name, "Ignoring service without an id");
            return;
        };

        if let Some(item) = self.items.iter_mut().find(|i| i.service_id == service_id) {
            item.quantity = item.quantity.saturating_add(quantity);
            item.recompute();
        } else {
            self.items.push(CartItem {
                service_id,
                service: service.clone(),
                quantity,
                unit_amount: service.base_price,
                total_amount: service.base_price * quantity as f64,
            });
        }
        self.save();
    }

    /// Set a line's quantity; anything below 1 becomes 1.
    pub fn update_quantity(&mut self, service_id: &str, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.service_id == service_id) {
            item.quantity = quantity.max(1);
            item.recompute();
            self.save();
        }
    }

    pub fn remove(&mut self, service_id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.service_id != service_id);
        if self.items.len() != before {
            self.save();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.save();
    }

    /// Build the order body for the current cart, with a 30% deposit.
    pub fn prepare_order(&self, user_id: &str) -> Result<NewOrder, SessionError> {
        if self.items.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let total_amount = self.total();
        Ok(NewOrder {
            status_main: OrderStatus::New,
            status_payment: PaymentStatus::PendingDeposit,
            total_amount,
            deposit_amount: total_amount * DEPOSIT_RATE,
            deadline_date: None,
            user_id: user_id.to_string(),
            order_items: self
                .items
                .iter()
                .map(|i| OrderItemInput {
                    service_id: i.service_id.clone(),
                    quantity: i.quantity,
                    unit_amount: i.unit_amount,
                    total_amount: i.total_amount,
                })
                .collect(),
        })
    }

    fn save(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(CART_KEY, &json));
        match result {
            Ok(()) => debug!(lines = self.items.len(), "Saved cart"),
            Err(e) => warn!(error = %e, "Failed to save cart"),
        }
    }
}
