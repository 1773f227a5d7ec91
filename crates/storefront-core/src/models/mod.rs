//! Data models for storefront API entities.
//!
//! These mirror the shapes the backend returns; the client does not own
//! any of this data. All JSON field names are camelCase.
//!
//! - `User`, `LoginCredentials`, `RegisterData`: accounts and authentication
//! - `Service`: purchasable service offerings
//! - `Order`, `OrderItem`: orders and the split deposit/final payment flow
//! - `ProjectRequest`: quote requests submitted from the public site

pub mod order;
pub mod project_request;
pub mod service;
pub mod user;

pub use order::{
    CheckoutStatus, NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderItemInput,
    OrderItemUpdate, OrderStatus, OrderUpdate, PaymentSession, PaymentStatus, PaymentType,
};
pub use project_request::{
    NewProjectRequest, ProjectRequest, ProjectRequestStatus, RequestedService,
};
pub use service::{Service, ServiceType, ServiceUpdate};
pub use user::{
    AuthData, LoginCredentials, NewUser, ProfileUpdate, RegisterData, Role, User, UserUpdate,
};
