//! Concrete adapter clients for the Syncline reconciliation engine.
//!
//! Two source/target pairs, each speaking REST/JSON through `reqwest`:
//!
//! - **Catalog → Registry**: connector instances from the catalog are
//!   mirrored as labelled applications in the registry, each carrying an
//!   API definition built from the instance's OpenAPI document and
//!   credentials ([`CatalogClient`] / [`RegistryClient`]).
//! - **Events → Webhooks**: active event subscriptions are mirrored as
//!   vendor webhook subscriptions, correlated through the configured
//!   [`TopicMap`] ([`EventServiceClient`] / [`WebhookClient`]).
//!
//! All clients implement the adapter traits from `syncline_core` and
//! translate their wire failures into [`syncline_core::AdapterError`].

pub mod catalog;
pub mod events;
mod http;
pub mod registry;
pub mod topics;
pub mod webhooks;

pub use catalog::{ApiSpecPayload, CatalogClient, CatalogConfig};
pub use events::{EventServiceClient, EventServiceConfig};
pub use registry::{RegistryClient, RegistryConfig};
pub use topics::{TopicMap, TopicMapping};
pub use webhooks::{WebhookClient, WebhookConfig};
