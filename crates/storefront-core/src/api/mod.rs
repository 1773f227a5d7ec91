//! Typed clients for the storefront REST API.
//!
//! Every client here goes through `SessionClient::send`, so all of them get
//! bearer injection and the one-shot refresh-and-replay on 401 for free.
//! Responses use the `{ success, message, data }` envelope (see `envelope`).

pub mod envelope;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod project_requests;
pub mod request;
pub mod services;
pub mod users;

pub use order_items::OrderItemApi;
pub use orders::OrderApi;
pub use payments::PaymentApi;
pub use project_requests::ProjectRequestApi;
pub use request::ApiRequest;
pub use services::ServiceApi;
pub use users::UserApi;

use crate::auth::SessionClient;

impl SessionClient {
    pub fn services(&self) -> ServiceApi {
        ServiceApi::new(self.clone())
    }

    pub fn users(&self) -> UserApi {
        UserApi::new(self.clone())
    }

    pub fn orders(&self) -> OrderApi {
        OrderApi::new(self.clone())
    }

    pub fn order_items(&self) -> OrderItemApi {
        OrderItemApi::new(self.clone())
    }

    pub fn payments(&self) -> PaymentApi {
        PaymentApi::new(self.clone())
    }

    pub fn project_requests(&self) -> ProjectRequestApi {
        ProjectRequestApi::new(self.clone())
    }
}
