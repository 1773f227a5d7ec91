use serde_json::Value;
use tracing::info;

use super::envelope::{decode, decode_keyed};
use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{NewOrderItem, OrderItem, OrderItemUpdate};

/// Individual order lines (admin).
#[derive(Clone)]
pub struct OrderItemApi {
    session: SessionClient,
}

impl OrderItemApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> Result<Vec<OrderItem>, SessionError> {
        self.session
            .get_json("/order-items", "Failed to fetch order items")
            .await
    }

    pub async fn get(&self, id: &str) -> Result<OrderItem, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/order-items/{}", id), "Failed to fetch order item")
            .await?;
        decode_keyed(data, "orderItem")
    }

    /// Lines of one order, read from the order itself. An order without
    /// lines yields an empty list.
    pub async fn for_order(&self, order_id: &str) -> Result<Vec<OrderItem>, SessionError> {
        let mut data: Value = self
            .session
            .get_json(&format!("/orders/{}", order_id), "Failed to fetch order items")
            .await?;
        let items = data
            .pointer_mut("/order/orderItems")
            .map(Value::take)
            .filter(|v| !v.is_null())
            .or_else(|| data.get_mut("orderItems").map(Value::take))
            .unwrap_or(Value::Null);
        if items.is_null() {
            return Ok(Vec::new());
        }
        decode(items)
    }

    pub async fn create(&self, item: &NewOrderItem) -> Result<OrderItem, SessionError> {
        let data: Value = self
            .session
            .post_json("/order-items", item, "Failed to create order item")
            .await?;
        let created: OrderItem = decode_keyed(data, "orderItem")?;
        info!(id = ?created.id, order_id = %item.order_id, "Created order item");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &OrderItemUpdate) -> Result<OrderItem, SessionError> {
        let data: Value = self
            .session
            .put_json(&format!("/order-items/{}", id), update, "Failed to update order item")
            .await?;
        decode_keyed(data, "orderItem")
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.session
            .delete_json(&format!("/order-items/{}", id), "Failed to delete order item")
            .await?;
        info!(id = id, "Deleted order item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::{NewOrderItem, OrderItemUpdate};
    use crate::storage::MemoryStore;
    use crate::SessionClient;

    fn item_json(id: &str, quantity: u32) -> serde_json::Value {
        json!({
            "id": id,
            "unitAmount": 500,
            "totalAmount": 500 * quantity,
            "quantity": quantity,
            "orderId": "o1",
            "serviceId": "s1"
        })
    }

    fn session(server: &MockServer) -> SessionClient {
        SessionClient::new(&server.uri(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_for_order_reads_nested_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/o1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"order": {"id": "o1", "orderItems": [item_json("i1", 2)]}}
            })))
            .mount(&server)
            .await;

        let items = session(&server).order_items().for_order("o1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total_amount, 1000.0);
    }

    #[tokio::test]
    async fn test_for_order_without_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/o2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": "o2"}
            })))
            .mount(&server)
            .await;

        let items = session(&server).order_items().for_order("o2").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/order-items"))
            .and(body_json(json!({
                "unitAmount": 500.0,
                "totalAmount": 1000.0,
                "quantity": 2,
                "orderId": "o1",
                "serviceId": "s1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": item_json("i1", 2)
            })))
            .expect(1)
            .mount(&server)
            .await;

        let new_item = NewOrderItem {
            unit_amount: 500.0,
            total_amount: 1000.0,
            quantity: 2,
            order_id: "o1".into(),
            service_id: "s1".into(),
        };
        let created = session(&server).order_items().create(&new_item).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("i1"));
    }

    #[tokio::test]
    async fn test_get_and_update_accept_wrapped_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/order-items/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"orderItem": item_json("i1", 1)}
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/order-items/i1"))
            .and(body_json(json!({"quantity": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"orderItem": item_json("i1", 3)}
            })))
            .mount(&server)
            .await;

        let api = session(&server).order_items();
        assert_eq!(api.get("i1").await.unwrap().quantity, 1);

        let update = OrderItemUpdate {
            quantity: Some(3),
            ..Default::default()
        };
        assert_eq!(api.update("i1", &update).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_delete_application_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/order-items/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Order already paid"
            })))
            .mount(&server)
            .await;

        let err = session(&server).order_items().delete("i1").await.unwrap_err();
        assert_eq!(err.to_string(), "Order already paid");
    }
}
