//! Midpoint REST API interaction module
//!
//! This module provides everything needed to drive a Midpoint instance
//! through its REST interface.
//!
//! # Module Structure
//!
//! - [`endpoints`] - Object type to REST collection mapping
//! - [`http`] - Authenticated HTTP calls with status validation
//! - [`xml`] - Namespace-aware element tree over `quick-xml`
//! - [`document`] - Extraction helpers for returned documents
//! - [`poll`] - Bounded polling for eventually consistent operations
//! - [`delta`] - `objectModification` builders
//! - [`client`] - Main client: lookup, updates, waits and tasks
//! - [`relations`] - Assignments and inducements
//! - [`sysconfig`] - System configuration upserts and deletions
//!
//! # Example
//!
//! ```ignore
//! use mpconf::midpoint::{MidpointClient, ObjectRef, PollSettings};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = MidpointClient::new(
//!         "http://midpoint:8080/midpoint/ws/rest/",
//!         "administrator",
//!         "secret",
//!         PollSettings::default(),
//!     )
//!     .await?;
//!     client
//!         .add_role_inducement_to_role(&ObjectRef::name("role01"), &ObjectRef::name("role02"))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod delta;
pub mod document;
pub mod endpoints;
pub mod http;
pub mod poll;
pub mod relations;
pub mod sysconfig;
pub mod xml;

pub use client::{MidpointClient, ObjectRef};
pub use delta::{ModificationType, RelationshipKind};
pub use poll::{PollSettings, Poller};
pub use relations::LinkOutcome;
pub use sysconfig::ConfigChange;
