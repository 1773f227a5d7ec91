//! Core library for the storefront client.
//!
//! This crate contains everything that talks to the storefront API or holds
//! client-side state:
//!
//! - `auth`: credential storage, authenticated requests and token refresh
//! - `api`: typed clients for services, users, orders, payments and project requests
//! - `cart`: the locally persisted shopping cart
//! - `storage`: durable key-value backends (file, OS keychain, memory)
//! - `models`: API data structures
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use auth::{SessionClient, SessionState, TokenStore};
pub use cart::Cart;
pub use config::Config;
pub use error::SessionError;
