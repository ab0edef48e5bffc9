//! Hierarchy store for the program catalog
//!
//! The single in-memory cache of the program tree, plus the pure logic
//! layered over it:
//! - [`HierarchyStore`] — de-duplicated fetch, lazy effort hydration,
//!   lookups, and save/delete round trips with explicit change
//!   notification
//! - [`forest`] — rebuilds the per-program effort forest from flat parent
//!   pointers
//! - [`resolve`] — per-section inheritance resolution along the effort
//!   parent chain
//! - [`selection`] — the current-selection handle, synchronized with the
//!   host's navigable location
//!
//! The store is explicitly constructed and passed by handle; there is no
//! ambient singleton. All mutation notifies observers through a version
//! counter, since nested in-place edits are invisible to readers
//! otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_gateway::{GatewayConfig, HttpGateway};
//! use catalog_store::{HierarchyStore, StoreConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(HttpGateway::new(GatewayConfig::new())?);
//! let store = HierarchyStore::new(gateway, StoreConfig::new());
//! store.fetch_hierarchy().await?;
//!
//! if let Some(node) = store.find_by_name("Avionics") {
//!     println!("{} has {} efforts", node.name, node.software_efforts.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod forest;
pub mod resolve;
pub mod selection;
pub mod store;

pub use error::StoreError;
pub use forest::{build_forest, EffortNode, EffortTreeError};
pub use resolve::{resolve_field, resolve_section, set_section_inherit, update_local};
pub use selection::{LocationPort, SelectionRef, SelectionState};
pub use store::{CatalogEntry, HierarchyStore, StoreConfig};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the catalog store
    pub use crate::{
        build_forest, CatalogEntry, EffortNode, HierarchyStore, SelectionRef, SelectionState,
        StoreConfig, StoreError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
