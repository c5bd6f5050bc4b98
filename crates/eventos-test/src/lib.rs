//! # eventos-test
//!
//! Testing tools for eventos applications.
//!
//! - [`client`] - [`TestClient`] drives an axum `Router` in-process and keeps
//!   cookies between requests, so flash messages survive a redirect
//! - [`assertions`] - Panicking checks on a [`TestResponse`]

pub mod assertions;
pub mod client;

pub use assertions::{assert_contains, assert_not_contains, assert_redirects, assert_status};
pub use client::{form_data, TestClient, TestResponse};
