//! Provider capability contract for CloudGraph.
//!
//! A provider is anything that can hand the scan driver credentials, an
//! account identity, raw per-service data and a handler per service type.
//! Providers are found by name in a [`ProviderRegistry`] populated at
//! startup; nothing is loaded dynamically.
//!
//! Built-in providers:
//! - [`inventory::InventoryProvider`] — replays a recorded JSON inventory with
//!   declarative per-service handlers
//! - [`mock::MockProvider`] — scripted provider for tests

mod error;
pub mod inventory;
pub mod mock;
mod provider;
mod registry;
mod selector;

pub use error::{ProviderError, ProviderResult};
pub use provider::{Credentials, DataRequest, Provider, ProviderOptions};
pub use registry::ProviderRegistry;
pub use selector::Selector;
