//! Remote login exchange.
//!
//! This module provides the `LoginExchange` seam the session manager talks
//! to, and `ApiClient`, its implementation over HTTP.
//!
//! The backend accepts `{username, password}` and answers with a bearer
//! token plus optional role and display name.

pub mod client;
pub mod error;
pub mod exchange;

pub use client::ApiClient;
pub use error::ExchangeError;
pub use exchange::{LoginData, LoginExchange, LoginRequest, LoginResponse};
