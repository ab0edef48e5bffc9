//! Remote data gateway for the program catalog
//!
//! A single [`CatalogGateway`] trait fronts two interchangeable backends:
//! - [`HttpGateway`] talks to the real catalog REST API (envelope decoding,
//!   CSRF header, endpoint prefixing)
//! - [`InMemoryGateway`] serves seeded fixtures for mock mode and tests,
//!   with per-operation call counters and failure injection
//!
//! The store layer only ever sees `Arc<dyn CatalogGateway>`; which backend
//! is behind it is a wiring decision.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod http;
pub mod memory;
pub mod user;

use async_trait::async_trait;
use catalog_model::{EffortUuid, ProgramId, ProgramNode, SoftwareEffort};

pub use error::{GatewayError, GatewayResult};
pub use http::{GatewayConfig, HttpGateway};
pub use memory::{HierarchyGate, InMemoryGateway};
pub use user::CurrentUser;

/// Backend seam for all catalog I/O
///
/// Every call answers the backend's `{success, data}` envelope collapsed
/// into a `Result`; nothing here panics on backend failure.
#[async_trait]
pub trait CatalogGateway: Send + Sync + std::fmt::Debug {
    /// Fetch the full program hierarchy (single root or forest)
    async fn fetch_hierarchy(&self) -> GatewayResult<Vec<ProgramNode>>;

    /// Fetch the software efforts attached to one program
    async fn fetch_efforts(&self, program: &ProgramId) -> GatewayResult<Vec<SoftwareEffort>>;

    /// Create or update one effort; returns the stored record (with the
    /// server-assigned id populated)
    async fn save_effort(
        &self,
        program: &ProgramId,
        effort: &SoftwareEffort,
    ) -> GatewayResult<SoftwareEffort>;

    /// Delete one effort by uuid
    async fn delete_effort(&self, uuid: &EffortUuid) -> GatewayResult<()>;

    /// Identity of the requesting user, for the route-guard collaborator
    async fn current_user(&self) -> GatewayResult<CurrentUser>;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
