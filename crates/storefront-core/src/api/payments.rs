//! Split payment flow: a deposit, then the remaining balance.
//!
//! Payment itself happens at the provider; the API only hands back opaque
//! hosted-checkout URLs and reports the session status.

use serde_json::{json, Value};
use tracing::info;

use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{CheckoutStatus, PaymentSession};

#[derive(Clone)]
pub struct PaymentApi {
    session: SessionClient,
}

impl PaymentApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// Checkout session for the deposit on `order_id`
    pub async fn deposit_session(&self, order_id: &str) -> Result<PaymentSession, SessionError> {
        let session: PaymentSession = self
            .session
            .post_json(
                &format!("/payment/orders/{}/deposit-payment", order_id),
                &json!({}),
                "Failed to create deposit payment link",
            )
            .await?;
        info!(order_id = order_id, session_id = %session.session_id, "Created deposit checkout");
        Ok(session)
    }

    /// Checkout session for the balance left after the deposit
    pub async fn final_session(&self, order_id: &str) -> Result<PaymentSession, SessionError> {
        let session: PaymentSession = self
            .session
            .post_json(
                &format!("/payment/orders/{}/final-payment", order_id),
                &json!({}),
                "Failed to create final payment link",
            )
            .await?;
        info!(order_id = order_id, session_id = %session.session_id, "Created final checkout");
        Ok(session)
    }

    /// Single full-amount checkout for an order, returning the hosted URL.
    ///
    /// Lives under `/payments` with `status`, not under the `/payment`
    /// prefix of the split-payment routes.
    pub async fn checkout_url(&self, order_id: &str) -> Result<String, SessionError> {
        let data: Value = self
            .session
            .post_json(
                "/payments/create-checkout-session",
                &json!({ "orderId": order_id }),
                "Failed to create checkout session",
            )
            .await?;
        data.get("sessionUrl")
            .or_else(|| data.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SessionError::MalformedResponse("checkout response has no URL".to_string()))
    }

    pub async fn status(&self, session_id: &str) -> Result<CheckoutStatus, SessionError> {
        self.session
            .get_json(
                &format!("/payments/status/{}", session_id),
                "Failed to check payment status",
            )
            .await
    }
}
