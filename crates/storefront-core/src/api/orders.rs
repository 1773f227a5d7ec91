use serde_json::{json, Value};
use tracing::info;

use super::envelope::{decode_keyed, read_body};
use super::ApiRequest;
use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{NewOrder, Order, OrderFilter, OrderStatus, OrderUpdate, PaymentType};

#[derive(Clone)]
pub struct OrderApi {
    session: SessionClient,
}

impl OrderApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// Orders belonging to the logged-in user
    pub async fn mine(&self) -> Result<Vec<Order>, SessionError> {
        self.session
            .get_json("/orders/my-orders", "Failed to fetch orders")
            .await
    }

    /// Every order (admin)
    pub async fn list(&self) -> Result<Vec<Order>, SessionError> {
        self.session.get_json("/orders", "Failed to fetch orders").await
    }

    pub async fn get(&self, id: &str) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/orders/{}", id), "Failed to fetch order")
            .await?;
        decode_keyed(data, "order")
    }

    /// Order with its user, lines and services expanded
    pub async fn details(&self, id: &str) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/orders/{}/details", id), "Order not found")
            .await?;
        decode_keyed(data, "order")
    }

    /// Hosted payment URL for the deposit or the balance of an order.
    ///
    /// The URL is read from `data.paymentUrl`, or from a top-level
    /// `paymentUrl` when the server puts it beside the envelope.
    pub async fn payment_link(
        &self,
        id: &str,
        payment_type: PaymentType,
    ) -> Result<String, SessionError> {
        let request = ApiRequest::post(format!("/orders/{}/payment-link", id))
            .json(&json!({ "paymentType": payment_type }))?;
        let response = self.session.send(request).await?;
        let body = read_body(response, "Failed to create payment link").await?;

        body.get("data")
            .and_then(|d| d.get("paymentUrl"))
            .or_else(|| body.get("paymentUrl"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SessionError::MalformedResponse("payment link response has no URL".to_string())
            })
    }

    /// Admin listing, optionally filtered by main and payment status
    pub async fn admin_list(&self, filter: &OrderFilter) -> Result<Vec<Order>, SessionError> {
        let mut request = ApiRequest::get("/admin/orders");
        if let Some(status) = filter.status {
            request = request.query("status", status.as_str());
        }
        if let Some(payment_status) = filter.payment_status {
            request = request.query("paymentStatus", payment_status.as_str());
        }
        self.session
            .request_json(request, "Failed to load orders")
            .await
    }

    /// Move an order to `status` (admin). Allowed transitions are checked
    /// by the server.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .patch_json(
                &format!("/admin/orders/{}/status", id),
                &json!({ "status": status }),
                "Failed to update order status",
            )
            .await?;
        let order: Order = decode_keyed(data, "order")?;
        info!(id = id, status = status.as_str(), "Updated order status");
        Ok(order)
    }

    /// Look up the order paid through a provider checkout session, used on
    /// the payment success page.
    pub async fn by_session(&self, session_id: &str) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .get_json(
                &format!("/orders/by-session/{}", session_id),
                "Failed to fetch order",
            )
            .await?;
        decode_keyed(data, "order")
    }

    pub async fn create_with_items(&self, order: &NewOrder) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .post_json("/orders/with-items", order, "Failed to create order")
            .await?;
        let created: Order = decode_keyed(data, "order")?;
        info!(
            id = ?created.id,
            total = created.total_amount,
            items = order.order_items.len(),
            "Created order"
        );
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &OrderUpdate) -> Result<Order, SessionError> {
        let data: Value = self
            .session
            .put_json(&format!("/orders/{}", id), update, "Failed to update order")
            .await?;
        decode_keyed(data, "order")
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.session
            .delete_json(&format!("/orders/{}", id), "Failed to delete order")
            .await?;
        info!(id = id, "Deleted order");
        Ok(())
    }
}
