//! Provider API interaction module
//!
//! Transport and wire types for the hosting provider's JSON API.
//!
//! # Module Structure
//!
//! - [`client`] - Provider client: endpoint layout and auth token attachment
//! - [`http`] - HTTP utilities for JSON POST calls
//! - [`envelope`] - Response envelopes, find queries and filters
//! - [`models`] - Webspace, vhost, database and user representations
//!
//! # Example
//!
//! ```ignore
//! use hostsync::api::{ApiClient, FindQuery, Filter, Service};
//! use hostsync::api::models::Webspace;
//!
//! async fn example(client: &ApiClient) -> hostsync::Result<()> {
//!     let query = FindQuery::new(Filter::field("webspaceId", "ws-1")).limit(1);
//!     let page = client.find::<Webspace>(Service::Webhosting, "webspacesFind", &query).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod envelope;
pub mod http;
pub mod models;

pub use client::{ApiClient, Service};
pub use envelope::{Filter, FindPage, FindQuery};
