//! Domain types for the program catalog
//!
//! Defines the data model shared by the gateway and store layers:
//! - Normalized identifiers ([`ProgramId`], [`EffortUuid`])
//! - The organizational hierarchy ([`ProgramNode`])
//! - Software efforts with inheritable profile sections ([`SoftwareEffort`],
//!   [`ProfileSection`], [`SectionProfile`])
//! - The uniform backend response envelope ([`Envelope`])
//!
//! Everything here is plain data: no I/O, no locking, no backend knowledge.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod effort;
pub mod envelope;
pub mod ids;
pub mod program;

pub use effort::{EffortValidationError, ProfileSection, SectionProfile, SoftwareEffort};
pub use envelope::{Envelope, EnvelopeError};
pub use ids::{EffortUuid, ProgramId};
pub use program::ProgramNode;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
