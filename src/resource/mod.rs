//! Resource abstraction layer
//!
//! # Architecture
//!
//! - [`kind`] - Resource kinds and the provider field names used to find them
//! - [`locator`] - Lookups by name, prefix and id with uniqueness checks
//!
//! # Example
//!
//! ```ignore
//! use hostsync::resource::Locator;
//! use hostsync::api::models::Webspace;
//!
//! async fn current(locator: &Locator<'_>) -> hostsync::Result<Option<Webspace>> {
//!     locator.find_one_by_name::<Webspace>("proj-app").await
//! }
//! ```

pub mod kind;
pub mod locator;

pub use kind::{Resource, ResourceDef, ResourceKind};
pub use locator::{Locator, ACTIVE};
